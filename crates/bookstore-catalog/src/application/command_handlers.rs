//! Command handlers for the catalog.
//!
//! Each handler applies one mutation event to a repository. Creates validate
//! their required fields; updates and deletes of records that no longer
//! exist succeed without doing anything, so redelivered events are harmless.

use tracing::info;

use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateAuthor, CreateBook, DeleteAuthor, DeleteBook, UpdateBook};
use bookstore_core::model::{Author, Book, BookPatch, NewAuthor, NewBook, non_blank};
use bookstore_core::repository::Repository;

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, DomainError> {
    non_blank(Some(value)).ok_or_else(|| DomainError::Validation(message.to_owned()))
}

/// Handles `CreateAuthor`: validates the name and stores a new author.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the name is blank, or the
/// repository's error if the insert fails.
pub async fn handle_create_author(
    event: &CreateAuthor,
    repo: &dyn Repository<Author>,
) -> Result<Author, DomainError> {
    let name = required(&event.name, "author name must not be empty")?;

    let author = repo
        .add(NewAuthor {
            name: name.to_owned(),
            date_of_birth: event.date_of_birth,
        })
        .await?;

    info!(author_id = %author.id, "author created");
    Ok(author)
}

/// Handles `DeleteAuthor`. Returns whether the author existed. Books that
/// reference the author are left alone.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is blank, or the repository's
/// error if the delete fails.
pub async fn handle_delete_author(
    event: &DeleteAuthor,
    repo: &dyn Repository<Author>,
) -> Result<bool, DomainError> {
    let id = required(&event.id, "author id must not be empty")?;

    let existed = repo.delete(id).await?;
    if existed {
        info!(author_id = id, "author deleted");
    } else {
        info!(author_id = id, "author not found, nothing to delete");
    }
    Ok(existed)
}

/// Handles `CreateBook`: validates the required fields and stores a new
/// book. The author reference is not checked.
///
/// # Errors
///
/// Returns `DomainError::Validation` if title, genre, author id or synopsis
/// is blank, or the repository's error if the insert fails.
pub async fn handle_create_book(
    event: &CreateBook,
    repo: &dyn Repository<Book>,
) -> Result<Book, DomainError> {
    let title = required(&event.title, "book title must not be empty")?;
    let genre = required(&event.genre, "book genre must not be empty")?;
    let author_id = required(&event.author_id, "book author id must not be empty")?;
    let synopsis = required(&event.synopsis, "book synopsis must not be empty")?;

    let book = repo
        .add(NewBook {
            title: title.to_owned(),
            author_id: author_id.to_owned(),
            synopsis: synopsis.to_owned(),
            image_url: event.image_url.trim().to_owned(),
            genre: genre.to_owned(),
        })
        .await?;

    info!(book_id = %book.id, "book created");
    Ok(book)
}

/// Handles `UpdateBook`. Returns the updated book, or `None` when the book
/// does not exist or the event changes nothing.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is blank, or the repository's
/// error if the update fails.
pub async fn handle_update_book(
    event: &UpdateBook,
    repo: &dyn Repository<Book>,
) -> Result<Option<Book>, DomainError> {
    let id = required(&event.id, "book id must not be empty")?;

    let patch = BookPatch {
        title: event.title.clone(),
        author_id: event.author_id.clone(),
        synopsis: event.synopsis.clone(),
        image_url: event.image_url.clone(),
        genre: event.genre.clone(),
    };
    if patch.is_empty() {
        info!(book_id = id, "update carries no changes, skipping");
        return Ok(None);
    }

    let updated = repo.update(id, &patch).await?;
    match &updated {
        Some(_) => info!(book_id = id, "book updated"),
        None => info!(book_id = id, "book not found, nothing to update"),
    }
    Ok(updated)
}

/// Handles `DeleteBook`. Returns whether the book existed.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is blank, or the repository's
/// error if the delete fails.
pub async fn handle_delete_book(
    event: &DeleteBook,
    repo: &dyn Repository<Book>,
) -> Result<bool, DomainError> {
    let id = required(&event.id, "book id must not be empty")?;

    let existed = repo.delete(id).await?;
    if existed {
        info!(book_id = id, "book deleted");
    } else {
        info!(book_id = id, "book not found, nothing to delete");
    }
    Ok(existed)
}
