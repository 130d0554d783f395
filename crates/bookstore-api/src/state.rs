//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use bookstore_bus::EventProducer;
use bookstore_cache::{Cache, DEFAULT_TTL};
use bookstore_core::clock::{Clock, SystemClock};

use crate::auth::TokenIssuer;
use crate::gateway::{AuthGateway, CatalogGateway};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Author and book reads.
    pub catalog: Arc<dyn CatalogGateway>,
    /// User reads and credential checks.
    pub users: Arc<dyn AuthGateway>,
    /// Read-through cache.
    pub cache: Arc<dyn Cache>,
    /// Event log producer for writes.
    pub producer: Arc<dyn EventProducer>,
    /// Bearer token issuer.
    pub tokens: TokenIssuer,
    /// Clock for event timestamps and token lifetimes.
    pub clock: Arc<dyn Clock>,
    /// Lifetime of cached reads.
    pub cache_ttl: Duration,
}

impl AppState {
    /// Create new application state with the system clock and the default
    /// cache lifetime.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogGateway>,
        users: Arc<dyn AuthGateway>,
        cache: Arc<dyn Cache>,
        producer: Arc<dyn EventProducer>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            catalog,
            users,
            cache,
            producer,
            tokens,
            clock: Arc::new(SystemClock),
            cache_ttl: DEFAULT_TTL,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the cache lifetime.
    #[must_use]
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }
}
