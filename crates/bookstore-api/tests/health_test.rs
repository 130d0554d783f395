//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let standalone = common::start(&[]).await;

    let (status, json) = common::get_json(common::app(&standalone), "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    standalone.shutdown().await;
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let standalone = common::start(&[]).await;

    let (status, _) = common::get_json(common::app(&standalone), "/publishers", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    standalone.shutdown().await;
}
