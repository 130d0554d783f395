//! Test cache — a `Cache` that is always down.

use std::time::Duration;

use async_trait::async_trait;
use bookstore_cache::{Cache, CacheError};

fn refused() -> CacheError {
    CacheError::Backend("connection refused".into())
}

/// A cache whose every operation fails. Useful for checking that cache
/// outages never fail a request.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(refused())
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(refused())
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
        Err(refused())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(refused())
    }
}
