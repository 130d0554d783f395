//! Document repositories for the bookstore backends.
//!
//! Two implementations of `bookstore_core::repository::Repository`: an
//! in-memory one for standalone mode and tests, and a PostgreSQL one that
//! keeps every collection in a single JSONB `documents` table.

pub mod memory;
pub mod pg_document_repository;
pub mod schema;

pub use memory::InMemoryRepository;
pub use pg_document_repository::PgDocumentRepository;
