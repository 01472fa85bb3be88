//! Payload checks answer before the database is touched, so these run offline.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn token() -> String {
    common::token_for(7, "Ana Técnica", "ana@empresa.test")
}

#[tokio::test]
async fn update_ticket_without_case_id_is_rejected() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let (status, body) = server
        .put("/api/tickets/update_ticket", &token(), &json!({ "status": 2 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["id_case"], "Campo requerido");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_invalid_json() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let res = server
        .client
        .put(server.url("/api/tickets/update_ticket"))
        .bearer_auth(token())
        .header("content-type", "application/json")
        .body("{ \"id_case\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn workflow_with_unknown_task_action_is_rejected() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let (status, body) = server
        .put(
            "/api/workflows/update_workflow",
            &token(),
            &json!({
                "id_process_category": 3,
                "tasks": [{ "action": "archive", "id_task": 1 }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn workflow_with_negative_cost_reports_task_field() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let (status, body) = server
        .post(
            "/api/workflows/create_workflow",
            &token(),
            &json!({
                "id_process": 1,
                "name": "Compras menores",
                "tasks": [
                    { "name": "Cotizar", "cost": "10.00" },
                    { "name": "Aprobar", "cost": "-1" }
                ]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["tasks[1].cost"].is_string());
    Ok(())
}

#[tokio::test]
async fn request_update_needs_a_change() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let (status, body) = server
        .put("/api/requests/update_request", &token(), &json!({ "id_general_request": 4 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}
