//! Shared test helpers for gateway integration tests.
#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use bookstore_api::config::ApiSettings;
use bookstore_api::server;
use bookstore_api::standalone::{Standalone, StandaloneConfig};
use bookstore_auth::password::Passwords;
use bookstore_runtime::config::IngestSettings;

pub const SECRET: &str = "integration-secret";

/// Starts both backends in-process with fast ingestion and cheap hashing.
pub async fn start(admins: &[&str]) -> Standalone {
    let config = StandaloneConfig {
        ingest: IngestSettings {
            idle_interval: Duration::from_millis(10),
            max_attempts: 3,
        },
        admins: admins.iter().map(|name| (*name).to_owned()).collect(),
        passwords: Passwords::low_cost().unwrap(),
        ..StandaloneConfig::new(ApiSettings::with_secret(SECRET))
    };
    Standalone::start(config, CancellationToken::new()).await.unwrap()
}

/// The gateway router over the standalone backends.
pub fn app(standalone: &Standalone) -> Router {
    server::app(standalone.state().clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    if body_bytes.is_empty() {
        return (status, serde_json::Value::Null);
    }
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send a POST request with a url-encoded form and return the response.
pub async fn post_form(app: Router, uri: &str, form: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_owned()))
        .unwrap();
    send(app, request).await
}

/// Send a GET request, with a bearer token when given, and return the
/// response.
pub async fn get_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// Polls `uri` until `done` accepts the response.
pub async fn eventually<F>(app: &Router, uri: &str, done: F) -> (StatusCode, serde_json::Value)
where
    F: Fn(StatusCode, &serde_json::Value) -> bool,
{
    let mut last = (StatusCode::IM_A_TEAPOT, serde_json::Value::Null);
    for _ in 0..400 {
        last = get_json(app.clone(), uri, None).await;
        if done(last.0, &last.1) {
            return last;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{uri} never reached the expected state, last response {last:?}");
}
