//! Command handlers for users.

use tracing::info;

use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateUser, UpdateUser};
use bookstore_core::model::{User, UserRole, non_blank};
use bookstore_core::repository::Repository;

use crate::model::{NewUser, UserFilter, UserPatch, UserRecord};
use crate::password::Passwords;

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, DomainError> {
    non_blank(Some(value)).ok_or_else(|| DomainError::Validation(message.to_owned()))
}

fn optional(value: Option<&String>) -> Option<String> {
    non_blank(value.map(String::as_str)).map(str::to_owned)
}

/// Handles `CreateUser`: validates the fields, hashes the password and
/// stores the user. Usernames listed in `admin_usernames` get the admin
/// role.
///
/// Returns `None` without storing anything when the username is already
/// taken, which also absorbs redelivery of the same event.
///
/// # Errors
///
/// Returns `DomainError::Validation` if username, password or email is
/// blank, or the repository's or hasher's error.
pub async fn handle_create_user(
    event: &CreateUser,
    repo: &dyn Repository<UserRecord>,
    passwords: &Passwords,
    admin_usernames: &[String],
) -> Result<Option<User>, DomainError> {
    let username = required(&event.username, "username must not be empty")?;
    if event.password.is_empty() {
        return Err(DomainError::Validation("password must not be empty".into()));
    }
    let email = required(&event.email, "email must not be empty")?;

    if !repo.get(&UserFilter::username(username)).await?.is_empty() {
        info!(username, "username already taken, skipping registration");
        return Ok(None);
    }

    let roles = if admin_usernames.iter().any(|admin| admin == username) {
        vec![UserRole::Admin]
    } else {
        Vec::new()
    };
    let record = repo
        .add(NewUser {
            username: username.to_owned(),
            password_hash: passwords.hash(&event.password).await?,
            email: email.to_owned(),
            first_name: optional(event.first_name.as_ref()),
            last_name: optional(event.last_name.as_ref()),
            roles,
        })
        .await?;

    info!(user_id = %record.id, username, "user created");
    Ok(Some(record.to_user()))
}

/// Handles `UpdateUser`. Returns the updated user, or `None` when the user
/// does not exist or the event changes nothing.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is blank, or the repository's
/// error if the update fails.
pub async fn handle_update_user(
    event: &UpdateUser,
    repo: &dyn Repository<UserRecord>,
) -> Result<Option<User>, DomainError> {
    let id = required(&event.id, "user id must not be empty")?;

    let patch = UserPatch {
        first_name: event.first_name.clone(),
        last_name: event.last_name.clone(),
        email: event.email.clone(),
    };
    if patch.is_empty() {
        info!(user_id = id, "update carries no changes, skipping");
        return Ok(None);
    }

    let updated = repo.update(id, &patch).await?;
    match &updated {
        Some(_) => info!(user_id = id, "user updated"),
        None => info!(user_id = id, "user not found, nothing to update"),
    }
    Ok(updated.as_ref().map(UserRecord::to_user))
}
