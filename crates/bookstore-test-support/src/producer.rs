//! Test producers — `EventProducer` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bookstore_bus::{BusError, EventProducer, Record};

/// A producer that records every published record and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    published: Mutex<Vec<Record>>,
    flushes: Mutex<usize>,
}

impl RecordingProducer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published records.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<Record> {
        self.published.lock().unwrap().clone()
    }

    /// Number of `flush` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn flushes(&self) -> usize {
        *self.flushes.lock().unwrap()
    }
}

#[async_trait]
impl EventProducer for RecordingProducer {
    async fn publish(&self, record: Record) -> Result<(), BusError> {
        self.published.lock().unwrap().push(record);
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), BusError> {
        *self.flushes.lock().unwrap() += 1;
        Ok(())
    }
}

/// A producer whose publishes always fail. Useful for testing that a write
/// is rejected when the event cannot be recorded.
#[derive(Debug, Default)]
pub struct FailingProducer;

#[async_trait]
impl EventProducer for FailingProducer {
    async fn publish(&self, _record: Record) -> Result<(), BusError> {
        Err(BusError::Publish("broker unavailable".into()))
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BusError> {
        Err(BusError::FlushTimeout(timeout))
    }
}
