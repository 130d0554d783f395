//! RPC endpoints of the catalog: `AuthorService` and `BookService`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, instrument};

use bookstore_core::model::{Author, Book};
use bookstore_rpc::protocol::{GetAuthor, GetAuthors, GetBook, GetBooks};
use bookstore_rpc::{RpcJson, RpcMethod, Status};

use crate::application::query_handlers;
use crate::service::CatalogService;

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

/// AuthorService/GetAuthors
#[instrument(skip_all)]
async fn get_authors(
    State(service): State<Arc<CatalogService>>,
    RpcJson(_request): RpcJson<GetAuthors>,
) -> Result<Json<Vec<Author>>, Status> {
    let authors = query_handlers::list_authors(service.authors()).await?;
    debug!(count = authors.len(), "listed authors");
    Ok(Json(authors))
}

/// AuthorService/GetAuthor
#[instrument(skip(service, request), fields(author_id = %request.id))]
async fn get_author(
    State(service): State<Arc<CatalogService>>,
    RpcJson(request): RpcJson<GetAuthor>,
) -> Result<Json<Author>, Status> {
    Ok(Json(
        query_handlers::get_author(&request.id, service.authors()).await?,
    ))
}

/// BookService/GetBooks
#[instrument(skip(service, request), fields(filter = ?request.filter))]
async fn get_books(
    State(service): State<Arc<CatalogService>>,
    RpcJson(request): RpcJson<GetBooks>,
) -> Result<Json<Vec<Book>>, Status> {
    let books = query_handlers::list_books(request.filter, service.books()).await?;
    debug!(count = books.len(), "listed books");
    Ok(Json(books))
}

/// BookService/GetBook
#[instrument(skip(service, request), fields(book_id = %request.id))]
async fn get_book(
    State(service): State<Arc<CatalogService>>,
    RpcJson(request): RpcJson<GetBook>,
) -> Result<Json<Book>, Status> {
    Ok(Json(query_handlers::get_book(&request.id, service.books()).await?))
}

/// Returns the RPC router, plus `/health`.
pub fn router() -> Router<Arc<CatalogService>> {
    Router::new()
        .route("/health", get(health_check))
        .route(&GetAuthors::path(), post(get_authors))
        .route(&GetAuthor::path(), post(get_author))
        .route(&GetBooks::path(), post(get_books))
        .route(&GetBook::path(), post(get_book))
}
