mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

async fn audit_rows(pool: &sqlx::PgPool, id_user: i32, action: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log WHERE entity = 'users' AND entity_id = $1 AND action = $2",
    )
    .bind(id_user)
    .bind(action)
    .fetch_one(pool)
    .await?)
}

#[tokio::test]
async fn granting_a_subprocess_is_audited_once() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let id_process = common::seed_process(&pool, company).await?;
    let id_subprocess = common::seed_subprocess(&pool, id_process).await?;
    let admin = common::seed_user(&pool, "admin").await?;
    let user = common::seed_user(&pool, "user").await?;
    let server = common::TestServer::start(state).await?;

    let grant = json!({ "id_user": user.id_user, "id_subprocess": id_subprocess, "id_company": company });
    for _ in 0..2 {
        let (status, body) = server.post("/api/users/subprocesses", &admin.token, &grant).await?;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }
    assert_eq!(audit_rows(&pool, user.id_user, "grant_subprocess").await?, 1);

    let (status, body) = server
        .get(&format!("/api/users/subprocesses/{}", user.id_user), &user.token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = server
        .get(&format!("/api/users/audit_log?entity=users&entity_id={}", user.id_user), &admin.token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["action"], "grant_subprocess");
    assert_eq!(body["data"][0]["actor_name"], json!(admin.name));
    Ok(())
}

#[tokio::test]
async fn regular_user_cannot_administer_users() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let company = common::seed_company(&pool).await?;
    let user = common::seed_user(&pool, "user").await?;
    let other = common::seed_user(&pool, "user").await?;
    let server = common::TestServer::start(state).await?;

    let (status, _) = server
        .post("/api/users/companies", &user.token, &json!({ "id_user": user.id_user, "id_company": company }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .get(&format!("/api/users/subprocesses/{}", other.id_user), &user.token)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM company_user WHERE id_user = $1")
        .bind(user.id_user)
        .fetch_one(&pool)
        .await?;
    assert_eq!(members, 0);
    Ok(())
}

#[tokio::test]
async fn role_change_takes_effect_on_next_request() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let admin = common::seed_user(&pool, "admin").await?;
    let user = common::seed_user(&pool, "user").await?;
    let server = common::TestServer::start(state).await?;

    let (status, _) = server.get("/api/users/list", &user.token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .put("/api/users/role", &admin.token, &json!({ "id_user": user.id_user, "role": "super_user" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(audit_rows(&pool, user.id_user, "set_role").await?, 1);

    // Same token, new role
    let (status, _) = server.get("/api/users/list", &user.token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .put("/api/users/role", &admin.token, &json!({ "id_user": admin.id_user, "role": "user" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn inactive_user_is_refused() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let pool = state.pool.clone();
    let user = common::seed_user(&pool, "admin").await?;
    sqlx::query("UPDATE users SET active = FALSE WHERE id_user = $1")
        .bind(user.id_user)
        .execute(&pool)
        .await?;
    let server = common::TestServer::start(state).await?;

    let (status, body) = server.get("/api/auth/whoami", &user.token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Usuario inactivo");
    Ok(())
}
