//! Stored user documents.

use serde::{Deserialize, Serialize};

use bookstore_core::model::{Document, FieldCondition, User, UserRole, non_blank};

/// A user as persisted: the public profile plus the password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Store-assigned identifier.
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// PHC-format password hash.
    pub password_hash: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    /// Public view without the password hash.
    #[must_use]
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Fields required to store a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// PHC-format password hash.
    pub password_hash: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Granted roles.
    pub roles: Vec<UserRole>,
}

/// User query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Exact login name; `None` matches everyone.
    pub username: Option<String>,
}

impl UserFilter {
    /// Matches the user called `username`.
    #[must_use]
    pub fn username(username: &str) -> Self {
        Self {
            username: Some(username.to_owned()),
        }
    }
}

/// Profile change. `None` or blank fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New contact address.
    pub email: Option<String>,
}

impl UserPatch {
    /// Whether applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.first_name, &self.last_name, &self.email]
            .into_iter()
            .all(|field| non_blank(field.as_deref()).is_none())
    }
}

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";

    type Draft = NewUser;
    type Filter = UserFilter;
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewUser) -> Self {
        Self {
            id,
            username: draft.username,
            password_hash: draft.password_hash,
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            roles: draft.roles,
        }
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter
            .username
            .as_deref()
            .is_none_or(|username| self.username == username)
    }

    fn conditions(filter: &UserFilter) -> Vec<FieldCondition> {
        filter
            .username
            .iter()
            .map(|username| FieldCondition::Equals("username", username.clone()))
            .collect()
    }

    fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(first_name) = non_blank(patch.first_name.as_deref()) {
            self.first_name = Some(first_name.to_owned());
        }
        if let Some(last_name) = non_blank(patch.last_name.as_deref()) {
            self.last_name = Some(last_name.to_owned());
        }
        if let Some(email) = non_blank(patch.email.as_deref()) {
            email.clone_into(&mut self.email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> UserRecord {
        UserRecord::from_draft(
            "u-1".to_owned(),
            NewUser {
                username: "ada".to_owned(),
                password_hash: "$argon2id$secret".to_owned(),
                email: "ada@example.com".to_owned(),
                first_name: None,
                last_name: Some("Lovelace".to_owned()),
                roles: Vec::new(),
            },
        )
    }

    #[test]
    fn test_public_view_has_no_password_hash() {
        let json = serde_json::to_value(ada().to_user()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "ada");
        assert!(!format!("{:?}", ada()).contains("secret"));
    }

    #[test]
    fn test_patch_keeps_fields_that_are_blank() {
        // Arrange
        let mut user = ada();
        let patch = UserPatch {
            first_name: Some("Augusta".to_owned()),
            last_name: Some("  ".to_owned()),
            email: None,
        };

        // Act
        user.apply_patch(&patch);

        // Assert
        assert_eq!(user.first_name.as_deref(), Some("Augusta"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_filter_matches_exact_username() {
        assert!(ada().matches(&UserFilter::username("ada")));
        assert!(!ada().matches(&UserFilter::username("Ada")));
        assert!(ada().matches(&UserFilter::default()));
    }
}
