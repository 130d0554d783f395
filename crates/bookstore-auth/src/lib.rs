//! Bookstore Auth — the users backend.
//!
//! Registrations and profile changes arrive as events and are applied by
//! supervised ingesters. Credential checks, user reads and username
//! availability are served over RPC. Password hashes never leave this
//! service.

pub mod application;
pub mod ingest;
pub mod model;
pub mod password;
pub mod rpc;
pub mod server;
pub mod service;

pub use service::AuthService;
