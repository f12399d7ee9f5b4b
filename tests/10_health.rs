mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["endpoints"]["products"].is_string());
    Ok(())
}
