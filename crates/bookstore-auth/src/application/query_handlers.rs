//! Query handlers for users.

use bookstore_core::error::DomainError;
use bookstore_core::model::{User, non_blank};
use bookstore_core::repository::Repository;

use crate::model::{UserFilter, UserRecord};
use crate::password::Passwords;

async fn find_by_username(
    username: &str,
    repo: &dyn Repository<UserRecord>,
) -> Result<Option<UserRecord>, DomainError> {
    Ok(repo
        .get(&UserFilter::username(username))
        .await?
        .into_iter()
        .next())
}

/// Checks `password` against the stored hash for `username`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if either field is empty,
/// `DomainError::NotFound` if no such user exists, and
/// `DomainError::Unauthenticated` if the password is wrong.
pub async fn login_user(
    username: &str,
    password: &str,
    repo: &dyn Repository<UserRecord>,
    passwords: &Passwords,
) -> Result<User, DomainError> {
    let Some(username) = non_blank(Some(username)) else {
        return Err(DomainError::Validation("username must not be empty".into()));
    };
    if password.is_empty() {
        return Err(DomainError::Validation("password must not be empty".into()));
    }

    let record = find_by_username(username, repo)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {username} not found")))?;

    if passwords.verify(password, &record.password_hash).await? {
        Ok(record.to_user())
    } else {
        Err(DomainError::Unauthenticated("invalid credentials".into()))
    }
}

/// Retrieves one user.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank id and
/// `DomainError::NotFound` if no user has it.
pub async fn get_user(id: &str, repo: &dyn Repository<UserRecord>) -> Result<User, DomainError> {
    let Some(id) = non_blank(Some(id)) else {
        return Err(DomainError::Validation("user id must not be empty".into()));
    };
    repo.get_by_id(id)
        .await?
        .map(|record| record.to_user())
        .ok_or_else(|| DomainError::NotFound(format!("user {id} not found")))
}

/// Whether no user is called `username`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank username.
pub async fn validate_username_unique(
    username: &str,
    repo: &dyn Repository<UserRecord>,
) -> Result<bool, DomainError> {
    let Some(username) = non_blank(Some(username)) else {
        return Err(DomainError::Validation("username must not be empty".into()));
    };
    Ok(find_by_username(username, repo).await?.is_none())
}
