//! Query handlers for the catalog.

use bookstore_core::error::DomainError;
use bookstore_core::model::{AllAuthors, Author, Book, BookFilter, non_blank};
use bookstore_core::repository::Repository;

fn required_id<'a>(id: &'a str, kind: &str) -> Result<&'a str, DomainError> {
    non_blank(Some(id)).ok_or_else(|| DomainError::Validation(format!("{kind} id must not be empty")))
}

/// Lists every author.
///
/// # Errors
///
/// Returns the repository's error if the read fails.
pub async fn list_authors(repo: &dyn Repository<Author>) -> Result<Vec<Author>, DomainError> {
    repo.get(&AllAuthors).await
}

/// Retrieves one author.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank id and
/// `DomainError::NotFound` if no author has it.
pub async fn get_author(id: &str, repo: &dyn Repository<Author>) -> Result<Author, DomainError> {
    let id = required_id(id, "author")?;
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("author {id} not found")))
}

/// Lists books matching `filter`. Blank filter fields match everything.
///
/// # Errors
///
/// Returns the repository's error if the read fails.
pub async fn list_books(
    filter: BookFilter,
    repo: &dyn Repository<Book>,
) -> Result<Vec<Book>, DomainError> {
    repo.get(&filter.normalized()).await
}

/// Retrieves one book.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank id and
/// `DomainError::NotFound` if no book has it.
pub async fn get_book(id: &str, repo: &dyn Repository<Book>) -> Result<Book, DomainError> {
    let id = required_id(id, "book")?;
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("book {id} not found")))
}
