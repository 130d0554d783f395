//! Mutation events carried on the event log.
//!
//! The gateway publishes these and the backend ingesters apply them. Payloads
//! are deliberately lenient on decode (missing strings become empty) so that
//! field validation happens once, at ingestion.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;

/// Topic names, one per mutation kind.
pub mod topics {
    /// Author creation.
    pub const CREATE_AUTHOR: &str = "createAuthor";
    /// Author deletion.
    pub const DELETE_AUTHOR: &str = "deleteAuthor";
    /// Book creation.
    pub const CREATE_BOOK: &str = "createBook";
    /// Partial book update.
    pub const UPDATE_BOOK: &str = "updateBook";
    /// Book deletion.
    pub const DELETE_BOOK: &str = "deleteBook";
    /// User registration.
    pub const CREATE_USER: &str = "createUser";
    /// Partial user profile update.
    pub const UPDATE_USER: &str = "updateUser";
}

/// Trait that all mutation events implement.
pub trait DomainEvent: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Topic the event is published to.
    const TOPIC: &'static str;

    /// Type name recorded in the envelope metadata.
    const EVENT_TYPE: &'static str;

    /// Partition key. Entity-scoped events return the entity id so every
    /// mutation of one entity lands on the same partition.
    fn partition_key(&self) -> Option<String> {
        None
    }
}

/// Metadata attached to every published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for routing and diagnostics.
    pub event_type: String,
    /// Correlation ID tying the event to the request that produced it.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Wire form of an event: metadata plus the typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E> {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub payload: E,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Wraps `payload` with fresh metadata.
    #[must_use]
    pub fn new(payload: E, correlation_id: Uuid, clock: &dyn Clock) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: E::EVENT_TYPE.to_owned(),
                correlation_id,
                occurred_at: clock.now(),
            },
            payload,
        }
    }

    /// Serializes the envelope to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the bytes are not a valid
    /// envelope for `E`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::Validation(format!("undecodable {} event: {e}", E::TOPIC)))
    }
}

/// Request to create an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAuthor {
    /// Display name.
    pub name: String,
    /// Date of birth, when known.
    pub date_of_birth: Option<DateTime<Utc>>,
}

impl DomainEvent for CreateAuthor {
    const TOPIC: &'static str = topics::CREATE_AUTHOR;
    const EVENT_TYPE: &'static str = "catalog.create_author";
}

/// Request to delete an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteAuthor {
    /// Author to delete.
    pub id: String,
}

impl DomainEvent for DeleteAuthor {
    const TOPIC: &'static str = topics::DELETE_AUTHOR;
    const EVENT_TYPE: &'static str = "catalog.delete_author";

    fn partition_key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

/// Request to create a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBook {
    /// Title.
    pub title: String,
    /// Author reference.
    pub author_id: String,
    /// Short description.
    pub synopsis: String,
    /// Cover image location.
    pub image_url: String,
    /// Genre label.
    pub genre: String,
}

impl DomainEvent for CreateBook {
    const TOPIC: &'static str = topics::CREATE_BOOK;
    const EVENT_TYPE: &'static str = "catalog.create_book";
}

/// Request to change some fields of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBook {
    /// Book to update.
    pub id: String,
    /// New title.
    pub title: Option<String>,
    /// New author reference.
    pub author_id: Option<String>,
    /// New synopsis.
    pub synopsis: Option<String>,
    /// New cover image location.
    pub image_url: Option<String>,
    /// New genre.
    pub genre: Option<String>,
}

impl DomainEvent for UpdateBook {
    const TOPIC: &'static str = topics::UPDATE_BOOK;
    const EVENT_TYPE: &'static str = "catalog.update_book";

    fn partition_key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

/// Request to delete a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteBook {
    /// Book to delete.
    pub id: String,
}

impl DomainEvent for DeleteBook {
    const TOPIC: &'static str = topics::DELETE_BOOK;
    const EVENT_TYPE: &'static str = "catalog.delete_book";

    fn partition_key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

/// Request to register a user. Carries the plaintext password until the
/// auth service hashes it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUser {
    /// Unique login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl DomainEvent for CreateUser {
    const TOPIC: &'static str = topics::CREATE_USER;
    const EVENT_TYPE: &'static str = "auth.create_user";

    fn partition_key(&self) -> Option<String> {
        Some(self.username.clone())
    }
}

/// Request to change a user's profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUser {
    /// User to update.
    pub id: String,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New contact address.
    pub email: Option<String>,
}

impl DomainEvent for UpdateUser {
    const TOPIC: &'static str = topics::UPDATE_USER;
    const EVENT_TYPE: &'static str = "auth.update_user";

    fn partition_key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct FrozenClock(DateTime<Utc>);

    impl Clock for FrozenClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_envelope_new_stamps_metadata_from_clock() {
        // Arrange
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let correlation_id = Uuid::new_v4();

        // Act
        let envelope = EventEnvelope::new(
            DeleteBook { id: "b-1".to_owned() },
            correlation_id,
            &FrozenClock(fixed_now),
        );

        // Assert
        assert_eq!(envelope.metadata.event_type, "catalog.delete_book");
        assert_eq!(envelope.metadata.correlation_id, correlation_id);
        assert_eq!(envelope.metadata.occurred_at, fixed_now);
    }

    #[test]
    fn test_envelope_decodes_missing_payload_fields_as_empty() {
        let bytes = serde_json::to_vec(&serde_json::json!({
            "metadata": {
                "eventId": Uuid::new_v4(),
                "eventType": "catalog.create_book",
                "correlationId": Uuid::new_v4(),
                "occurredAt": "2026-01-15T10:00:00Z"
            },
            "payload": { "genre": "scifi" }
        }))
        .unwrap();

        let envelope = EventEnvelope::<CreateBook>::from_slice(&bytes).unwrap();

        assert_eq!(envelope.payload.genre, "scifi");
        assert!(envelope.payload.title.is_empty());
    }

    #[test]
    fn test_envelope_from_garbage_is_validation_error() {
        let err = EventEnvelope::<DeleteAuthor>::from_slice(b"not json").unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_entity_events_are_keyed_by_id() {
        assert_eq!(
            UpdateBook {
                id: "b-9".to_owned(),
                ..UpdateBook::default()
            }
            .partition_key(),
            Some("b-9".to_owned())
        );
        assert_eq!(CreateBook::default().partition_key(), None);
    }

    #[test]
    fn test_create_user_debug_redacts_password() {
        let event = CreateUser {
            username: "ada".to_owned(),
            password: "hunter2".to_owned(),
            ..CreateUser::default()
        };

        let rendered = format!("{event:?}");

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
