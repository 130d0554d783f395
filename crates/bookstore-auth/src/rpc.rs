//! RPC endpoints of the auth service: `UserService`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, instrument};

use bookstore_core::model::User;
use bookstore_rpc::protocol::{GetUser, LoginUser, UsernameAvailability, ValidateUsernameUnique};
use bookstore_rpc::{RpcJson, RpcMethod, Status};

use crate::application::query_handlers;
use crate::service::AuthService;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// UserService/LoginUser
#[instrument(skip(service, request), fields(username = %request.username))]
async fn login_user(
    State(service): State<Arc<AuthService>>,
    RpcJson(request): RpcJson<LoginUser>,
) -> Result<Json<User>, Status> {
    let user = query_handlers::login_user(
        &request.username,
        &request.password,
        service.users(),
        service.passwords(),
    )
    .await?;
    info!(user_id = %user.id, "login succeeded");
    Ok(Json(user))
}

/// UserService/GetUser
#[instrument(skip(service, request), fields(user_id = %request.id))]
async fn get_user(
    State(service): State<Arc<AuthService>>,
    RpcJson(request): RpcJson<GetUser>,
) -> Result<Json<User>, Status> {
    Ok(Json(query_handlers::get_user(&request.id, service.users()).await?))
}

/// UserService/ValidateUsernameUnique
#[instrument(skip(service, request), fields(username = %request.username))]
async fn validate_username_unique(
    State(service): State<Arc<AuthService>>,
    RpcJson(request): RpcJson<ValidateUsernameUnique>,
) -> Result<Json<UsernameAvailability>, Status> {
    let unique = query_handlers::validate_username_unique(&request.username, service.users()).await?;
    Ok(Json(UsernameAvailability { unique }))
}

/// Returns the RPC router, plus `/health`.
pub fn router() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/health", get(health_check))
        .route(&LoginUser::path(), post(login_user))
        .route(&GetUser::path(), post(get_user))
        .route(&ValidateUsernameUnique::path(), post(validate_username_unique))
}
