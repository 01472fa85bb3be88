mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct StoredCase {
    id_status: i32,
    end_date: Option<chrono::DateTime<chrono::Utc>>,
    id_category: Option<i32>,
    id_subcategory: Option<i32>,
    id_activity: Option<i32>,
}

async fn stored_case(pool: &PgPool, id_case: i32) -> Result<StoredCase> {
    Ok(sqlx::query_as::<_, StoredCase>(
        r#"
        SELECT c.id_status, c.end_date, cc.id_category, cc.id_subcategory, cc.id_activity
        FROM cases c
        LEFT JOIN category_case cc ON cc.id_case = c.id_case
        WHERE c.id_case = $1
        "#,
    )
    .bind(id_case)
    .fetch_one(pool)
    .await?)
}

#[tokio::test]
async fn admin_updates_status_and_classification() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let admin = common::seed_user(&pool, "admin").await?;
    let requester = common::seed_user(&pool, "user").await?;
    let tree = common::seed_classification(&pool).await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;

    let (status, body) = server
        .put(
            "/api/tickets/update_ticket",
            &admin.token,
            &json!({
                "id_case": id_case,
                "status": 2,
                "id_category": tree.id_category,
                "id_subcategory": tree.id_subcategory,
                "id_activity": tree.id_activity
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Caso actualizado exitosamente");

    let case = stored_case(&pool, id_case).await?;
    assert_eq!(case.id_status, 2);
    assert!(case.end_date.is_none());
    assert_eq!(case.id_category, Some(tree.id_category));
    assert_eq!(case.id_subcategory, Some(tree.id_subcategory));
    assert_eq!(case.id_activity, Some(tree.id_activity));
    Ok(())
}

#[tokio::test]
async fn update_ticket_accepts_post_with_full_payload() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let admin = common::seed_user(&pool, "admin").await?;
    let requester = common::seed_user(&pool, "user").await?;
    let tree = common::seed_classification(&pool).await?;
    let id_department: i32 =
        sqlx::query_scalar("INSERT INTO departments (id_company, name) VALUES ($1, 'Sistemas') RETURNING id_department")
            .bind(company)
            .fetch_one(&pool)
            .await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;

    let (status, body) = server
        .post(
            "/api/tickets/update_ticket",
            &admin.token,
            &json!({
                "id_case": id_case,
                "status": 2,
                "priority": "Alta",
                "case_type": "Incidente",
                "id_category": tree.id_category,
                "id_subcategory": tree.id_subcategory,
                "id_activity": tree.id_activity,
                "id_department": id_department
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Caso actualizado exitosamente");

    let case = stored_case(&pool, id_case).await?;
    assert_eq!(case.id_status, 2);
    assert_eq!(
        (case.id_category, case.id_subcategory, case.id_activity),
        (Some(tree.id_category), Some(tree.id_subcategory), Some(tree.id_activity))
    );

    let (priority, case_type, stored_department): (String, String, Option<i32>) =
        sqlx::query_as("SELECT priority, case_type, id_department FROM cases WHERE id_case = $1")
            .bind(id_case)
            .fetch_one(&pool)
            .await?;
    assert_eq!(priority, "Alta");
    assert_eq!(case_type, "Incidente");
    assert_eq!(stored_department, Some(id_department));
    Ok(())
}

#[tokio::test]
async fn closing_status_sets_end_date() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let admin = common::seed_user(&pool, "super_user").await?;
    let requester = common::seed_user(&pool, "user").await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;

    let (status, _) = server
        .put("/api/tickets/update_ticket", &admin.token, &json!({ "id_case": id_case, "status": 3 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(stored_case(&pool, id_case).await?.end_date.is_some());
    Ok(())
}

#[tokio::test]
async fn classification_only_update_keeps_status_and_end_date() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let admin = common::seed_user(&pool, "admin").await?;
    let requester = common::seed_user(&pool, "user").await?;
    let tree = common::seed_classification(&pool).await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;

    let (status, _) = server
        .post("/api/tickets/update_ticket", &admin.token, &json!({ "id_case": id_case, "status": 3 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let closed_at = stored_case(&pool, id_case).await?.end_date;
    assert!(closed_at.is_some());

    let (status, body) = server
        .post(
            "/api/tickets/update_ticket",
            &admin.token,
            &json!({ "id_case": id_case, "id_category": tree.id_category }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let case = stored_case(&pool, id_case).await?;
    assert_eq!(case.id_status, 3);
    assert_eq!(case.end_date, closed_at);
    assert_eq!(case.id_category, Some(tree.id_category));

    let (status, body) = server
        .post("/api/tickets/update_ticket", &admin.token, &json!({ "id_case": id_case }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn technical_account_may_update_its_case() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let requester = common::seed_user(&pool, "user").await?;
    let technician = common::seed_user(&pool, "user").await?;
    let id_case = common::seed_case(&pool, company, &requester, Some(&technician)).await?;
    let server = common::TestServer::start(state).await?;

    let (status, body) = server
        .put("/api/tickets/update_ticket", &technician.token, &json!({ "id_case": id_case, "status": 2 }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(stored_case(&pool, id_case).await?.id_status, 2);
    Ok(())
}

#[tokio::test]
async fn unassigned_user_is_forbidden_and_nothing_changes() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let requester = common::seed_user(&pool, "user").await?;
    let technician = common::seed_user(&pool, "user").await?;
    let outsider = common::seed_user(&pool, "user").await?;
    let id_case = common::seed_case(&pool, company, &requester, Some(&technician)).await?;
    let server = common::TestServer::start(state).await?;

    for user in [&outsider, &requester] {
        let (status, body) = server
            .put("/api/tickets/update_ticket", &user.token, &json!({ "id_case": id_case, "status": 3 }))
            .await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    let case = stored_case(&pool, id_case).await?;
    assert_eq!(case.id_status, 1);
    assert!(case.end_date.is_none());
    Ok(())
}

#[tokio::test]
async fn failed_classification_rolls_back_case_update() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let admin = common::seed_user(&pool, "admin").await?;
    let requester = common::seed_user(&pool, "user").await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;

    let (status, body) = server
        .put(
            "/api/tickets/update_ticket",
            &admin.token,
            &json!({ "id_case": id_case, "status": 2, "id_category": i32::MAX }),
        )
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error al actualizar el caso");
    assert!(body["details"].is_string());

    let case = stored_case(&pool, id_case).await?;
    assert_eq!(case.id_status, 1);
    assert_eq!(case.id_category, None);
    Ok(())
}

#[tokio::test]
async fn unknown_case_is_not_found() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::seed_user(&state.pool, "admin").await?;
    let server = common::TestServer::start(state).await?;

    let (status, _) = server
        .put("/api/tickets/update_ticket", &admin.token, &json!({ "id_case": i32::MAX, "status": 2 }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn requester_can_comment_but_outsider_cannot_read() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let requester = common::seed_user(&pool, "user").await?;
    let outsider = common::seed_user(&pool, "user").await?;
    let id_case = common::seed_case(&pool, company, &requester, None).await?;
    let server = common::TestServer::start(state).await?;
    let path = format!("/api/tickets/notes/{}", id_case);

    let (status, body) = server.post(&path, &requester.token, &json!({ "note": "Sigue fallando" })).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["note"], "Sigue fallando");

    let (status, body) = server.get(&path, &requester.token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = server.get(&path, &outsider.token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
