//! Read-side cache for the gateway.
//!
//! Entries are keyed by [`keys::CacheKey`], which derives a deterministic key
//! from the query that produced a value. Writes invalidate by namespace
//! prefix. Every failure here is soft from the caller's point of view: the
//! helpers in [`read_through`] log and fall back to the source of truth.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis_cache;

pub use keys::{CacheKey, Namespace};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A cached value could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),
}

/// Key-value store with TTL and prefix enumeration.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the value stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Lists every live key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Removes `keys`, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;
}
