//! In-memory registry with TTL-based health.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::{Registry, RegistryError, ServiceInstance};

/// Health TTL used by [`InMemoryRegistry::new`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Entry {
    instance: ServiceInstance,
    last_pass: Instant,
}

/// Process-local registry. An instance is healthy while its last health
/// report is younger than the TTL.
#[derive(Debug)]
pub struct InMemoryRegistry {
    ttl: Duration,
    entries: Mutex<Vec<Entry>>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// Creates a registry with [`DEFAULT_TTL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a registry with a custom health TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        let mut entries = self.lock();
        entries.retain(|entry| entry.instance.instance_id != instance.instance_id);
        entries.push(Entry {
            instance: instance.clone(),
            last_pass: Instant::now(),
        });
        debug!(instance_id = %instance.instance_id, address = %instance.address, "instance registered");
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), RegistryError> {
        self.lock()
            .retain(|entry| entry.instance.instance_id != instance_id);
        Ok(())
    }

    async fn health_check(&self, instance_id: &str) -> Result<(), RegistryError> {
        let mut entries = self.lock();
        let entry = entries
            .iter_mut()
            .find(|entry| entry.instance.instance_id == instance_id)
            .ok_or_else(|| RegistryError::NotRegistered(instance_id.to_owned()))?;
        entry.last_pass = Instant::now();
        Ok(())
    }

    async fn discover(&self, service_name: &str) -> Result<Vec<String>, RegistryError> {
        let now = Instant::now();
        Ok(self
            .lock()
            .iter()
            .filter(|entry| entry.instance.service_name == service_name)
            .filter(|entry| now.duration_since(entry.last_pass) <= self.ttl)
            .map(|entry| entry.instance.address.to_string())
            .collect())
    }
}
