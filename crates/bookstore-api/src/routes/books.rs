//! Routes for books.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use bookstore_cache::read_through::read_through;
use bookstore_cache::{CacheKey, Namespace};
use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateBook, DeleteBook, UpdateBook};
use bookstore_core::model::{Book, BookFilter};

use crate::error::{ApiError, ApiJson};
use crate::publish::publish_event;
use crate::state::AppState;

/// Request body for POST /books.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBookRequest {
    /// Title.
    pub title: String,
    /// Id of the author.
    pub author_id: String,
    /// Short description.
    pub synopsis: String,
    /// Cover image location.
    pub image_url: String,
    /// Genre label.
    pub genre: String,
}

/// Request body for PATCH /books/{id}. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBookRequest {
    /// New title.
    pub title: Option<String>,
    /// New author id.
    pub author_id: Option<String>,
    /// New synopsis.
    pub synopsis: Option<String>,
    /// New cover image location.
    pub image_url: Option<String>,
    /// New genre.
    pub genre: Option<String>,
}

/// GET /books?title&genre&authorId
#[instrument(skip(state))]
async fn list_books(
    State(state): State<AppState>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let filter = filter.normalized();
    let books = read_through(
        state.cache.as_ref(),
        &CacheKey::book_list(&filter),
        state.cache_ttl,
        || state.catalog.get_books(&filter),
    )
    .await?;
    Ok(Json(books))
}

/// GET /books/{id}
#[instrument(skip(state))]
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = read_through(
        state.cache.as_ref(),
        &CacheKey::book(&id),
        state.cache_ttl,
        || state.catalog.get_book(&id),
    )
    .await?;
    Ok(Json(book))
}

/// POST /books
#[instrument(skip(state, request), fields(title = %request.title))]
async fn create_book(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBookRequest>,
) -> Result<StatusCode, ApiError> {
    if request.title.trim().is_empty() {
        return Err(DomainError::Validation("title is required".into()).into());
    }
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling create_book command");

    let event = CreateBook {
        title: request.title,
        author_id: request.author_id,
        synopsis: request.synopsis,
        image_url: request.image_url,
        genre: request.genre,
    };
    Ok(publish_event(&state, event, correlation_id, Some(Namespace::Books)).await?)
}

/// PATCH /books/{id}
#[instrument(skip(state, request))]
async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBookRequest>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling update_book command");

    let event = UpdateBook {
        id,
        title: request.title,
        author_id: request.author_id,
        synopsis: request.synopsis,
        image_url: request.image_url,
        genre: request.genre,
    };
    Ok(publish_event(&state, event, correlation_id, Some(Namespace::Books)).await?)
}

/// DELETE /books/{id}
#[instrument(skip(state))]
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling delete_book command");

    Ok(publish_event(&state, DeleteBook { id }, correlation_id, Some(Namespace::Books)).await?)
}

/// Returns the router for books.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
}
