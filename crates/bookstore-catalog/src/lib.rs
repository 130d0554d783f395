//! Bookstore Catalog — the authors and books backend.
//!
//! Mutations arrive only as events on the event log and are applied by
//! supervised ingesters. Reads are served over RPC to the gateway.

pub mod application;
pub mod ingest;
pub mod rpc;
pub mod server;
pub mod service;

pub use service::CatalogService;
