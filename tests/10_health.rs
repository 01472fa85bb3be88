mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["endpoints"]["tickets"], "/api/tickets/*");
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn health_is_ok_with_database() -> Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let server = common::TestServer::start(state).await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn api_requires_bearer_token() -> Result<()> {
    let server = common::TestServer::start(common::offline_state()?).await?;

    let res = server
        .client
        .put(server.url("/api/tickets/update_ticket"))
        .json(&json!({ "id_case": 1, "status": 2 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = server.get("/api/tickets/list", "not-a-token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    Ok(())
}
