//! Bookstore API — the HTTP gateway.
//!
//! Reads go through the cache to the catalog and auth backends, which are
//! found through the service registry. Writes are validated, published to
//! the event log and answered with 202 before any backend applies them.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod publish;
pub mod routes;
pub mod server;
pub mod standalone;
pub mod state;

#[cfg(test)]
mod testing;
