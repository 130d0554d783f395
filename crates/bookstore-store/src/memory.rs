//! In-memory implementation of the `Repository` trait.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use bookstore_core::error::DomainError;
use bookstore_core::model::Document;
use bookstore_core::repository::Repository;

/// Process-local document collection that preserves insertion order.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    documents: Mutex<Vec<T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Document> InMemoryRepository<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InMemoryRepository<T> {
    async fn add(&self, draft: T::Draft) -> Result<T, DomainError> {
        let document = T::from_draft(Uuid::new_v4().to_string(), draft);
        self.lock().push(document.clone());
        Ok(document)
    }

    async fn get(&self, filter: &T::Filter) -> Result<Vec<T>, DomainError> {
        Ok(self
            .lock()
            .iter()
            .filter(|doc| doc.matches(filter))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>, DomainError> {
        Ok(self.lock().iter().find(|doc| doc.id() == id).cloned())
    }

    async fn update(&self, id: &str, patch: &T::Patch) -> Result<Option<T>, DomainError> {
        let mut documents = self.lock();
        Ok(documents.iter_mut().find(|doc| doc.id() == id).map(|doc| {
            doc.apply_patch(patch);
            doc.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let mut documents = self.lock();
        let before = documents.len();
        documents.retain(|doc| doc.id() != id);
        Ok(documents.len() != before)
    }
}
