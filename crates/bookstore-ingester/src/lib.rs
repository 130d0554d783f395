//! Bookstore Ingester — applies mutation events from the event log to a
//! store.
//!
//! One [`Ingester`] tails one topic under a consumer group. Each message is
//! decoded, applied with bounded retries for transient failures and
//! committed; messages that cannot be applied go to a dead-letter sink and
//! the ingester moves on. Ingesters run as supervised tasks that are
//! restarted after a panic.

pub mod dead_letter;
pub mod ingester;
pub mod supervisor;

pub use dead_letter::{DeadLetter, DeadLetterSink, LoggingDeadLetterSink, TopicDeadLetterSink};
pub use ingester::{
    ApplyEvent, Decoder, IngestCounts, IngestStats, Ingester, IngesterConfig, IngesterHandle,
};
pub use supervisor::spawn_supervised;
