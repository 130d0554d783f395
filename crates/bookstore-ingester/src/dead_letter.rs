//! Dead-letter handling for messages that could not be applied.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use bookstore_bus::{BusError, EventProducer, Message, Record};
use bookstore_core::error::DomainError;

/// Dead-letter topic for `topic`.
#[must_use]
pub fn dead_letter_topic(topic: &str) -> String {
    format!("{topic}.dlq")
}

/// A message that was given up on, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    /// Topic the message was read from.
    pub source_topic: String,
    /// Partition of the original message.
    pub partition: i32,
    /// Offset of the original message.
    pub offset: i64,
    /// Partition key of the original message.
    pub key: Option<String>,
    /// Error class, see [`DomainError::code`].
    pub code: String,
    /// Error detail.
    pub error: String,
    /// The original payload; JSON when it parses, a string otherwise.
    pub payload: Value,
}

impl DeadLetter {
    /// Describes `message` as failed with `err`.
    #[must_use]
    pub fn new(message: &Message, err: &DomainError) -> Self {
        let payload = serde_json::from_slice(&message.payload).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&message.payload).into_owned())
        });
        Self {
            source_topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
            key: message.key.clone(),
            code: err.code().to_owned(),
            error: err.detail().to_owned(),
            payload,
        }
    }
}

/// Destination for dead letters.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Records `letter`.
    async fn send(&self, letter: DeadLetter) -> Result<(), BusError>;
}

/// Publishes dead letters to `<topic>.dlq` on the event log, keeping the
/// original partition key.
pub struct TopicDeadLetterSink {
    producer: Arc<dyn EventProducer>,
}

impl TopicDeadLetterSink {
    /// Creates a sink publishing through `producer`.
    #[must_use]
    pub fn new(producer: Arc<dyn EventProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl DeadLetterSink for TopicDeadLetterSink {
    async fn send(&self, letter: DeadLetter) -> Result<(), BusError> {
        let payload =
            serde_json::to_vec(&letter).map_err(|e| BusError::Publish(e.to_string()))?;
        self.producer
            .publish(Record {
                topic: dead_letter_topic(&letter.source_topic),
                key: letter.key,
                payload,
            })
            .await
    }
}

/// Logs dead letters at error level and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDeadLetterSink;

#[async_trait]
impl DeadLetterSink for LoggingDeadLetterSink {
    async fn send(&self, letter: DeadLetter) -> Result<(), BusError> {
        error!(
            topic = %letter.source_topic,
            partition = letter.partition,
            offset = letter.offset,
            code = %letter.code,
            error = %letter.error,
            "dropping message that could not be applied"
        );
        Ok(())
    }
}
