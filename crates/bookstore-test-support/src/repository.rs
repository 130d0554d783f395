//! Test repositories — fault-injecting `Repository` implementations.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bookstore_core::error::DomainError;
use bookstore_core::model::Document;
use bookstore_core::repository::Repository;

fn connection_refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository<T>(PhantomData<fn() -> T>);

impl<T> FailingRepository<T> {
    /// Creates the repository.
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FailingRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for FailingRepository<T> {
    async fn add(&self, _draft: T::Draft) -> Result<T, DomainError> {
        Err(connection_refused())
    }

    async fn get(&self, _filter: &T::Filter) -> Result<Vec<T>, DomainError> {
        Err(connection_refused())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<T>, DomainError> {
        Err(connection_refused())
    }

    async fn update(&self, _id: &str, _patch: &T::Patch) -> Result<Option<T>, DomainError> {
        Err(connection_refused())
    }

    async fn delete(&self, _id: &str) -> Result<bool, DomainError> {
        Err(connection_refused())
    }
}

/// Wraps a repository and fails the first `failures` calls with an
/// infrastructure error before delegating. Useful for testing retries.
pub struct FlakyRepository<T: Document> {
    inner: Arc<dyn Repository<T>>,
    remaining: AtomicUsize,
    calls: AtomicUsize,
}

impl<T: Document> FlakyRepository<T> {
    /// Fails `failures` times, then behaves like `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Repository<T>>, failures: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn trip(&self) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(connection_refused())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<T: Document> Repository<T> for FlakyRepository<T> {
    async fn add(&self, draft: T::Draft) -> Result<T, DomainError> {
        self.trip()?;
        self.inner.add(draft).await
    }

    async fn get(&self, filter: &T::Filter) -> Result<Vec<T>, DomainError> {
        self.trip()?;
        self.inner.get(filter).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>, DomainError> {
        self.trip()?;
        self.inner.get_by_id(id).await
    }

    async fn update(&self, id: &str, patch: &T::Patch) -> Result<Option<T>, DomainError> {
        self.trip()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        self.trip()?;
        self.inner.delete(id).await
    }
}
