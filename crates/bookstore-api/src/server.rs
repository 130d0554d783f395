//! Gateway router assembly and serving.

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use bookstore_runtime::{Node, RuntimeError};

use crate::routes;
use crate::state::AppState;

/// Service name the gateway registers under.
pub const API_SERVICE: &str = "api";

/// The full gateway router with layers, bound to `state`.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    routes::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the gateway on `node` until `cancel` fires.
///
/// # Errors
///
/// Returns `RuntimeError::Server` if the server fails.
pub async fn run(node: Node, state: AppState, cancel: CancellationToken) -> Result<(), RuntimeError> {
    node.serve(app(state), cancel).await
}
