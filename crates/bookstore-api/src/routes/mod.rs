//! Route modules organized by resource.

use axum::Router;

use crate::state::AppState;

pub mod authors;
pub mod books;
pub mod health;
pub mod users;

/// Every gateway route, without layers or state.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(authors::router())
        .merge(books::router())
        .merge(users::router())
}
