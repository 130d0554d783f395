//! The catalog service: repositories plus the event appliers that feed them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use bookstore_cache::read_through::invalidate_namespace;
use bookstore_cache::{Cache, Namespace};
use bookstore_core::error::DomainError;
use bookstore_core::event::{
    CreateAuthor, CreateBook, DeleteAuthor, DeleteBook, EventEnvelope, UpdateBook,
};
use bookstore_core::model::{Author, Book};
use bookstore_core::repository::Repository;
use bookstore_ingester::ApplyEvent;

use crate::application::command_handlers;

/// Author and book repositories, and optionally the gateway's cache.
///
/// When a cache is attached, every applied mutation drops the cached reads
/// of its resource type, so a read that raced the ingester cannot keep
/// serving pre-mutation data until the entry expires.
pub struct CatalogService {
    authors: Arc<dyn Repository<Author>>,
    books: Arc<dyn Repository<Book>>,
    cache: Option<Arc<dyn Cache>>,
}

impl CatalogService {
    /// Creates a service without cache invalidation.
    #[must_use]
    pub fn new(authors: Arc<dyn Repository<Author>>, books: Arc<dyn Repository<Book>>) -> Self {
        Self {
            authors,
            books,
            cache: None,
        }
    }

    /// Attaches the cache shared with the gateway.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Author repository.
    #[must_use]
    pub fn authors(&self) -> &dyn Repository<Author> {
        self.authors.as_ref()
    }

    /// Book repository.
    #[must_use]
    pub fn books(&self) -> &dyn Repository<Book> {
        self.books.as_ref()
    }

    async fn invalidate(&self, namespace: Namespace) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = invalidate_namespace(cache.as_ref(), namespace).await {
            warn!(namespace = %namespace, error = %e, "post-apply cache invalidation failed");
        }
    }
}

#[async_trait]
impl ApplyEvent<CreateAuthor> for CatalogService {
    async fn apply(&self, envelope: &EventEnvelope<CreateAuthor>) -> Result<(), DomainError> {
        command_handlers::handle_create_author(&envelope.payload, self.authors()).await?;
        self.invalidate(Namespace::Authors).await;
        Ok(())
    }
}

#[async_trait]
impl ApplyEvent<DeleteAuthor> for CatalogService {
    async fn apply(&self, envelope: &EventEnvelope<DeleteAuthor>) -> Result<(), DomainError> {
        if command_handlers::handle_delete_author(&envelope.payload, self.authors()).await? {
            self.invalidate(Namespace::Authors).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ApplyEvent<CreateBook> for CatalogService {
    async fn apply(&self, envelope: &EventEnvelope<CreateBook>) -> Result<(), DomainError> {
        command_handlers::handle_create_book(&envelope.payload, self.books()).await?;
        self.invalidate(Namespace::Books).await;
        Ok(())
    }
}

#[async_trait]
impl ApplyEvent<UpdateBook> for CatalogService {
    async fn apply(&self, envelope: &EventEnvelope<UpdateBook>) -> Result<(), DomainError> {
        if command_handlers::handle_update_book(&envelope.payload, self.books())
            .await?
            .is_some()
        {
            self.invalidate(Namespace::Books).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ApplyEvent<DeleteBook> for CatalogService {
    async fn apply(&self, envelope: &EventEnvelope<DeleteBook>) -> Result<(), DomainError> {
        if command_handlers::handle_delete_book(&envelope.payload, self.books()).await? {
            self.invalidate(Namespace::Books).await;
        }
        Ok(())
    }
}
