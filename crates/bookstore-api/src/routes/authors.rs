//! Routes for authors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use bookstore_cache::read_through::read_through;
use bookstore_cache::{CacheKey, Namespace};
use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateAuthor, DeleteAuthor};
use bookstore_core::model::{Author, non_blank};

use crate::error::{ApiError, ApiJson};
use crate::publish::publish_event;
use crate::state::AppState;

/// Request body for POST /authors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Date of birth.
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// GET /authors
#[instrument(skip(state))]
async fn list_authors(State(state): State<AppState>) -> Result<Json<Vec<Author>>, ApiError> {
    let authors = read_through(
        state.cache.as_ref(),
        &CacheKey::author_list(),
        state.cache_ttl,
        || state.catalog.get_authors(),
    )
    .await?;
    Ok(Json(authors))
}

/// GET /authors/{id}
#[instrument(skip(state))]
async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let author = read_through(
        state.cache.as_ref(),
        &CacheKey::author(&id),
        state.cache_ttl,
        || state.catalog.get_author(&id),
    )
    .await?;
    Ok(Json(author))
}

/// POST /authors
#[instrument(skip(state, request))]
async fn create_author(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAuthorRequest>,
) -> Result<StatusCode, ApiError> {
    let Some(name) = non_blank(Some(request.name.as_str())) else {
        return Err(DomainError::Validation("name is required".into()).into());
    };
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling create_author command");

    let event = CreateAuthor {
        name: name.to_owned(),
        date_of_birth: request.date_of_birth,
    };
    Ok(publish_event(&state, event, correlation_id, Some(Namespace::Authors)).await?)
}

/// DELETE /authors/{id}
#[instrument(skip(state))]
async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling delete_author command");

    Ok(publish_event(&state, DeleteAuthor { id }, correlation_id, Some(Namespace::Authors)).await?)
}

/// Returns the router for authors.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors).post(create_author))
        .route("/authors/{id}", get(get_author).delete(delete_author))
}
