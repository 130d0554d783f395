//! The auth service: user repository, password hasher and admin list.

use std::sync::Arc;

use async_trait::async_trait;

use bookstore_core::error::DomainError;
use bookstore_core::event::{CreateUser, EventEnvelope, UpdateUser};
use bookstore_core::repository::Repository;
use bookstore_ingester::ApplyEvent;

use crate::application::command_handlers;
use crate::model::UserRecord;
use crate::password::Passwords;

/// Everything the user handlers need.
pub struct AuthService {
    users: Arc<dyn Repository<UserRecord>>,
    passwords: Passwords,
    admin_usernames: Vec<String>,
}

impl AuthService {
    /// Creates a service with no admin usernames.
    #[must_use]
    pub fn new(users: Arc<dyn Repository<UserRecord>>, passwords: Passwords) -> Self {
        Self {
            users,
            passwords,
            admin_usernames: Vec::new(),
        }
    }

    /// Usernames that receive the admin role when they register.
    #[must_use]
    pub fn with_admins(mut self, admin_usernames: Vec<String>) -> Self {
        self.admin_usernames = admin_usernames;
        self
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> &dyn Repository<UserRecord> {
        self.users.as_ref()
    }

    /// Password hasher.
    #[must_use]
    pub fn passwords(&self) -> &Passwords {
        &self.passwords
    }
}

#[async_trait]
impl ApplyEvent<CreateUser> for AuthService {
    async fn apply(&self, envelope: &EventEnvelope<CreateUser>) -> Result<(), DomainError> {
        command_handlers::handle_create_user(
            &envelope.payload,
            self.users(),
            &self.passwords,
            &self.admin_usernames,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ApplyEvent<UpdateUser> for AuthService {
    async fn apply(&self, envelope: &EventEnvelope<UpdateUser>) -> Result<(), DomainError> {
        command_handlers::handle_update_user(&envelope.payload, self.users()).await?;
        Ok(())
    }
}
