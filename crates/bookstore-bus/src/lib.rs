//! Event log abstractions.
//!
//! Producers append records to named topics; consumers in a named group tail
//! a topic and commit offsets once a record has been handled. Two backends:
//! [`memory::InMemoryEventLog`] for standalone mode and tests, and Kafka
//! behind the `kafka` feature.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use bookstore_core::error::DomainError;

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;

pub use memory::InMemoryEventLog;

/// Errors raised by event log backends.
#[derive(Debug, Error)]
pub enum BusError {
    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A record could not be published.
    #[error("publish failed: {0}")]
    Publish(String),

    /// A consumer could not join its group or topic.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// Reading from the topic failed.
    #[error("consume failed: {0}")]
    Consume(String),

    /// An offset could not be committed.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Pending records were not delivered within the flush timeout.
    #[error("flush timed out after {0:?}")]
    FlushTimeout(Duration),
}

impl From<BusError> for DomainError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Connection(message) => DomainError::Connection(message),
            other => DomainError::Infrastructure(other.to_string()),
        }
    }
}

/// A record to append to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Destination topic.
    pub topic: String,
    /// Partition key; records with equal keys keep their relative order.
    pub key: Option<String>,
    /// Opaque payload.
    pub payload: Vec<u8>,
}

/// A record read back from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source topic.
    pub topic: String,
    /// Partition the record was read from.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Partition key, if any.
    pub key: Option<String>,
    /// Opaque payload.
    pub payload: Vec<u8>,
}

/// Publishing side of the event log.
#[async_trait]
pub trait EventProducer: Send + Sync {
    /// Appends `record` to its topic.
    async fn publish(&self, record: Record) -> Result<(), BusError>;

    /// Waits up to `timeout` for previously published records to be
    /// delivered.
    async fn flush(&self, timeout: Duration) -> Result<(), BusError>;
}

/// Creates consumers bound to a topic and consumer group.
#[async_trait]
pub trait ConsumerFactory: Send + Sync {
    /// Joins `group_id` on `topic`.
    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Box<dyn EventConsumer>, BusError>;
}

/// Consuming side of the event log.
#[async_trait]
pub trait EventConsumer: Send {
    /// Topic this consumer is bound to.
    fn topic(&self) -> &str;

    /// Returns the next record. `None` as timeout blocks until one is
    /// available; `Some(Duration::ZERO)` only returns what is already
    /// buffered. Returns `Ok(None)` when the timeout elapses.
    async fn poll(&mut self, timeout: Option<Duration>) -> Result<Option<Message>, BusError>;

    /// Marks `message` and everything before it on its partition as handled.
    async fn commit(&mut self, message: &Message) -> Result<(), BusError>;
}
