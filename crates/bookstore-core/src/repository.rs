//! Document repository abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::Document;

/// Persistence seam for one document collection.
///
/// `update` and `delete` report whether the record existed instead of
/// failing, which is what lets event application be idempotent.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Stores a new document under a freshly assigned id and returns it.
    async fn add(&self, draft: T::Draft) -> Result<T, DomainError>;

    /// Returns every document matching `filter`, oldest first.
    async fn get(&self, filter: &T::Filter) -> Result<Vec<T>, DomainError>;

    /// Returns the document with the given id, if any.
    async fn get_by_id(&self, id: &str) -> Result<Option<T>, DomainError>;

    /// Applies `patch` to the document with the given id. Returns the updated
    /// document, or `None` if it does not exist.
    async fn update(&self, id: &str, patch: &T::Patch) -> Result<Option<T>, DomainError>;

    /// Removes the document with the given id. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
}
