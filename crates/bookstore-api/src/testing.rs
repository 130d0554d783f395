//! Stub gateways and state builders for router unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use bookstore_bus::EventProducer;
use bookstore_cache::Cache;
use bookstore_core::error::DomainError;
use bookstore_core::model::{Author, Book, BookFilter, User, UserRole};
use bookstore_test_support::FixedClock;

use crate::auth::TokenIssuer;
use crate::gateway::{AuthGateway, CatalogGateway};
use crate::state::AppState;

pub const SECRET: &str = "test-secret";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

pub fn tokens() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::from_secs(3600))
}

pub fn dune() -> Book {
    Book {
        id: "b-1".to_owned(),
        title: "Dune".to_owned(),
        author_id: "a-1".to_owned(),
        synopsis: "Spice".to_owned(),
        image_url: String::new(),
        genre: "scifi".to_owned(),
    }
}

pub fn herbert() -> Author {
    Author {
        id: "a-1".to_owned(),
        name: "Frank Herbert".to_owned(),
        date_of_birth: None,
    }
}

pub fn user(id: &str, username: &str, roles: Vec<UserRole>) -> User {
    User {
        id: id.to_owned(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        first_name: None,
        last_name: None,
        roles,
    }
}

/// Serves one author and one book, counting every call.
#[derive(Default)]
pub struct StubCatalog {
    pub calls: AtomicUsize,
}

impl StubCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogGateway for StubCatalog {
    async fn get_authors(&self) -> Result<Vec<Author>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![herbert()])
    }

    async fn get_author(&self, id: &str) -> Result<Author, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(herbert())
            .filter(|author| author.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("author {id} not found")))
    }

    async fn get_books(&self, filter: &BookFilter) -> Result<Vec<Book>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let book = dune();
        let genre_matches = filter.genre.as_ref().is_none_or(|genre| *genre == book.genre);
        Ok(if genre_matches { vec![book] } else { Vec::new() })
    }

    async fn get_book(&self, id: &str) -> Result<Book, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(dune())
            .filter(|book| book.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("book {id} not found")))
    }
}

/// Knows `ada` (password `engine`, id `u-1`) and admin `root` (`u-0`).
pub struct StubUsers;

#[async_trait]
impl AuthGateway for StubUsers {
    async fn login_user(&self, username: &str, password: &str) -> Result<User, DomainError> {
        match (username, password) {
            ("ada", "engine") => Ok(user("u-1", "ada", vec![])),
            ("ada", _) => Err(DomainError::Unauthenticated("invalid credentials".into())),
            _ => Err(DomainError::NotFound(format!("user {username} not found"))),
        }
    }

    async fn get_user(&self, id: &str) -> Result<User, DomainError> {
        match id {
            "u-1" => Ok(user("u-1", "ada", vec![])),
            "u-0" => Ok(user("u-0", "root", vec![UserRole::Admin])),
            _ => Err(DomainError::NotFound(format!("user {id} not found"))),
        }
    }

    async fn validate_username_unique(&self, username: &str) -> Result<bool, DomainError> {
        Ok(!matches!(username, "ada" | "root"))
    }
}

pub fn state_with_catalog(
    catalog: Arc<StubCatalog>,
    producer: Arc<dyn EventProducer>,
    cache: Arc<dyn Cache>,
) -> AppState {
    AppState::new(catalog, Arc::new(StubUsers), cache, producer, tokens())
        .with_clock(Arc::new(FixedClock(now())))
}

pub fn state(producer: Arc<dyn EventProducer>, cache: Arc<dyn Cache>) -> AppState {
    state_with_catalog(Arc::new(StubCatalog::default()), producer, cache)
}

/// `Authorization` header value for `user`.
pub fn bearer(user: &User) -> String {
    format!("Bearer {}", tokens().issue(user, now()).unwrap())
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Runs `request` through `app`. An empty body reads as `Value::Null`.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body_bytes.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&body_bytes).unwrap())
}
