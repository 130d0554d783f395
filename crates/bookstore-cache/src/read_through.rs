//! Soft cache helpers.
//!
//! None of these ever fail the caller because of the cache: a broken or
//! unreachable cache degrades to a miss on read and a logged warning on
//! write or invalidation.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use bookstore_core::error::DomainError;

use crate::keys::{CacheKey, Namespace};
use crate::{Cache, CacheError};

/// Reads and decodes `key`. Errors and undecodable entries count as misses.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &CacheKey) -> Option<T> {
    match cache.get(key.as_str()).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key = %key, error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

/// Encodes and stores `value` under `key`, logging any failure.
pub async fn put_json<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &CacheKey,
    value: &T,
    ttl: Duration,
) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key = %key, error = %e, "cache value encoding failed");
            return;
        }
    };
    if let Err(e) = cache.set(key.as_str(), bytes, ttl).await {
        warn!(key = %key, error = %e, "cache write failed");
    }
}

/// Returns the cached value for `key`, or runs `load`, caches its result for
/// `ttl` and returns it. Errors from `load` are returned and never cached.
///
/// # Errors
///
/// Returns whatever `load` returns.
pub async fn read_through<T, F, Fut>(
    cache: &dyn Cache,
    key: &CacheKey,
    ttl: Duration,
    load: F,
) -> Result<T, DomainError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    if let Some(hit) = get_json(cache, key).await {
        debug!(key = %key, "cache hit");
        return Ok(hit);
    }

    debug!(key = %key, "cache miss");
    let value = load().await?;
    put_json(cache, key, &value, ttl).await;
    Ok(value)
}

/// Deletes every key in `namespace`. Over-invalidates on purpose: any write
/// to a resource type drops every cached query of that type.
///
/// # Errors
///
/// Returns `CacheError` if the scan or the delete fails.
pub async fn invalidate_namespace(
    cache: &dyn Cache,
    namespace: Namespace,
) -> Result<u64, CacheError> {
    let keys = cache.keys_with_prefix(&namespace.prefix()).await?;
    if keys.is_empty() {
        return Ok(0);
    }
    let removed = cache.delete(&keys).await?;
    debug!(namespace = %namespace, removed, "invalidated cache namespace");
    Ok(removed)
}
