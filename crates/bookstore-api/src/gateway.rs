//! Backend gateways: the reads and checks the HTTP handlers delegate.
//!
//! Each trait has one production implementation on [`RpcClient`], which
//! resolves the backend through the registry on every call. Remote status
//! codes arrive as `DomainError` variants.

use async_trait::async_trait;

use bookstore_core::error::DomainError;
use bookstore_core::model::{Author, Book, BookFilter, User};
use bookstore_rpc::RpcClient;
use bookstore_rpc::protocol::{
    GetAuthor, GetAuthors, GetBook, GetBooks, GetUser, LoginUser, ValidateUsernameUnique,
};

/// Author and book reads served by the catalog backend.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// All authors.
    async fn get_authors(&self) -> Result<Vec<Author>, DomainError>;

    /// One author.
    async fn get_author(&self, id: &str) -> Result<Author, DomainError>;

    /// Books matching `filter`.
    async fn get_books(&self, filter: &BookFilter) -> Result<Vec<Book>, DomainError>;

    /// One book.
    async fn get_book(&self, id: &str) -> Result<Book, DomainError>;
}

/// User reads and credential checks served by the auth backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// The user whose password matches.
    async fn login_user(&self, username: &str, password: &str) -> Result<User, DomainError>;

    /// One user.
    async fn get_user(&self, id: &str) -> Result<User, DomainError>;

    /// Whether `username` is still free.
    async fn validate_username_unique(&self, username: &str) -> Result<bool, DomainError>;
}

#[async_trait]
impl CatalogGateway for RpcClient {
    async fn get_authors(&self) -> Result<Vec<Author>, DomainError> {
        Ok(self.call(&GetAuthors {}).await?)
    }

    async fn get_author(&self, id: &str) -> Result<Author, DomainError> {
        Ok(self.call(&GetAuthor { id: id.to_owned() }).await?)
    }

    async fn get_books(&self, filter: &BookFilter) -> Result<Vec<Book>, DomainError> {
        Ok(self
            .call(&GetBooks {
                filter: filter.clone(),
            })
            .await?)
    }

    async fn get_book(&self, id: &str) -> Result<Book, DomainError> {
        Ok(self.call(&GetBook { id: id.to_owned() }).await?)
    }
}

#[async_trait]
impl AuthGateway for RpcClient {
    async fn login_user(&self, username: &str, password: &str) -> Result<User, DomainError> {
        Ok(self
            .call(&LoginUser {
                username: username.to_owned(),
                password: password.to_owned(),
            })
            .await?)
    }

    async fn get_user(&self, id: &str) -> Result<User, DomainError> {
        Ok(self.call(&GetUser { id: id.to_owned() }).await?)
    }

    async fn validate_username_unique(&self, username: &str) -> Result<bool, DomainError> {
        let availability = self
            .call(&ValidateUsernameUnique {
                username: username.to_owned(),
            })
            .await?;
        Ok(availability.unique)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bookstore_discovery::InMemoryRegistry;

    use super::*;

    #[tokio::test]
    async fn test_missing_backend_is_service_unavailable() {
        // Arrange
        let client = RpcClient::new(Arc::new(InMemoryRegistry::new()), Duration::from_secs(1)).unwrap();

        // Act
        let books = client.get_books(&BookFilter::default()).await;
        let unique = client.validate_username_unique("ada").await;

        // Assert
        assert!(matches!(books, Err(DomainError::ServiceUnavailable(_))));
        assert!(matches!(unique, Err(DomainError::ServiceUnavailable(_))));
    }
}
