//! Routes for login and user accounts under `/auth`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateUser, UpdateUser};
use bookstore_core::model::User;

use crate::auth::{AuthenticatedUser, ensure_same_user_or_admin};
use crate::error::{ApiError, ApiForm, ApiJson};
use crate::publish::publish_event;
use crate::state::AppState;

/// Form body for POST /auth/login.
#[derive(Deserialize)]
pub struct LoginForm {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Signed bearer token.
    pub token: String,
}

/// Request body for POST /auth/users.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

/// Request body for PATCH /auth/users/{id}.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New contact address.
    pub email: Option<String>,
}

/// Loose shape check: one `@` with a dotted domain after it.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// POST /auth/login
#[instrument(skip(state, form), fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .login_user(&form.username, &form.password)
        .await
        .map_err(ApiError::login)?;
    let token = state.tokens.issue(&user, state.clock.now())?;
    info!(user_id = %user.id, "login succeeded");
    Ok(Json(LoginResponse { token }))
}

/// POST /auth/users
#[instrument(skip(state, request), fields(username = %request.username))]
async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<StatusCode, ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation("username is required".into()).into());
    }
    if request.password.is_empty() {
        return Err(DomainError::Validation("password is required".into()).into());
    }
    if !is_plausible_email(request.email.trim()) {
        return Err(DomainError::Validation("email is invalid".into()).into());
    }
    if !state.users.validate_username_unique(username).await? {
        return Err(DomainError::Validation("username already exists".into()).into());
    }

    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling create_user command");

    let event = CreateUser {
        username: username.to_owned(),
        password: request.password,
        email: request.email.trim().to_owned(),
        first_name: request.first_name,
        last_name: request.last_name,
    };
    Ok(publish_event(&state, event, correlation_id, None).await?)
}

/// GET /auth/users/{id}
#[instrument(skip(state, caller))]
async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    ensure_same_user_or_admin(&caller, &id)?;
    Ok(Json(state.users.get_user(&id).await?))
}

/// PATCH /auth/users/{id}
#[instrument(skip(state, caller, request))]
async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    ensure_same_user_or_admin(&caller, &id)?;
    if request
        .email
        .as_deref()
        .is_some_and(|email| !is_plausible_email(email.trim()))
    {
        return Err(DomainError::Validation("email is invalid".into()).into());
    }
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, caller = %caller.sub, "handling update_user command");

    let event = UpdateUser {
        id,
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email.map(|email| email.trim().to_owned()),
    };
    Ok(publish_event(&state, event, correlation_id, None).await?)
}

/// Returns the router for `/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/users", post(create_user))
        .route("/auth/users/{id}", get(get_user).patch(update_user))
}
