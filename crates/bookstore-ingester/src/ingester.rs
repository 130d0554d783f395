//! The generic topic ingester.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use bookstore_bus::{BusError, ConsumerFactory, EventConsumer, Message};
use bookstore_core::error::DomainError;
use bookstore_core::event::{DomainEvent, EventEnvelope};

use crate::dead_letter::{DeadLetter, DeadLetterSink};
use crate::supervisor::spawn_supervised;

/// Turns raw message bytes into a typed envelope.
pub type Decoder<E> = fn(&[u8]) -> Result<EventEnvelope<E>, DomainError>;

/// Applies one decoded event to the store.
///
/// Implementations must be idempotent for update and delete events: the
/// same message may be delivered more than once.
#[async_trait]
pub trait ApplyEvent<E: DomainEvent>: Send + Sync {
    /// Applies `envelope`. Transient errors are retried by the caller.
    async fn apply(&self, envelope: &EventEnvelope<E>) -> Result<(), DomainError>;
}

/// Tuning for one ingester.
#[derive(Debug, Clone)]
pub struct IngesterConfig {
    /// Consumer group, normally the service name.
    pub group_id: String,
    /// Pause between drained batches.
    pub idle_interval: Duration,
    /// Attempts per message before it is dead-lettered (at least one).
    pub max_attempts: usize,
    /// First retry delay.
    pub min_backoff: Duration,
    /// Longest retry delay.
    pub max_backoff: Duration,
    /// Pause after a failed read.
    pub read_retry_delay: Duration,
    /// Pause before the supervisor restarts a crashed ingester.
    pub restart_delay: Duration,
}

impl IngesterConfig {
    /// Defaults for `group_id`: 10 s idle interval, 3 attempts.
    #[must_use]
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            idle_interval: Duration::from_secs(10),
            max_attempts: 3,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            read_retry_delay: Duration::from_secs(1),
            restart_delay: Duration::from_secs(1),
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_backoff)
            .with_max_delay(self.max_backoff)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

/// Live counters of one ingester.
#[derive(Debug, Default)]
pub struct IngestStats {
    applied: AtomicU64,
    skipped: AtomicU64,
    dead_lettered: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    /// Messages applied successfully.
    pub applied: u64,
    /// Undecodable messages skipped.
    pub skipped: u64,
    /// Messages handed to the dead-letter sink.
    pub dead_lettered: u64,
}

impl IngestCounts {
    /// Messages handled in any way.
    #[must_use]
    pub fn handled(&self) -> u64 {
        self.applied + self.skipped + self.dead_lettered
    }
}

impl IngestStats {
    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> IngestCounts {
        IngestCounts {
            applied: self.applied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
        }
    }
}

/// Tails `E::TOPIC` and applies every event through an [`ApplyEvent`].
pub struct Ingester<E: DomainEvent> {
    consumers: Arc<dyn ConsumerFactory>,
    apply: Arc<dyn ApplyEvent<E>>,
    dead_letters: Arc<dyn DeadLetterSink>,
    decoder: Decoder<E>,
    config: IngesterConfig,
    stats: Arc<IngestStats>,
}

impl<E: DomainEvent> Clone for Ingester<E> {
    fn clone(&self) -> Self {
        Self {
            consumers: Arc::clone(&self.consumers),
            apply: Arc::clone(&self.apply),
            dead_letters: Arc::clone(&self.dead_letters),
            decoder: self.decoder,
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

/// A running, supervised ingester.
#[derive(Debug)]
pub struct IngesterHandle {
    /// Topic being ingested.
    pub topic: &'static str,
    /// Live counters.
    pub stats: Arc<IngestStats>,
    /// Supervisor task; resolves to the restart count once cancelled.
    pub task: JoinHandle<u64>,
}

impl<E: DomainEvent> Ingester<E> {
    /// Creates an ingester decoding JSON envelopes.
    #[must_use]
    pub fn new(
        consumers: Arc<dyn ConsumerFactory>,
        apply: Arc<dyn ApplyEvent<E>>,
        dead_letters: Arc<dyn DeadLetterSink>,
        config: IngesterConfig,
    ) -> Self {
        Self {
            consumers,
            apply,
            dead_letters,
            decoder: EventEnvelope::<E>::from_slice,
            config,
            stats: Arc::new(IngestStats::default()),
        }
    }

    /// Replaces the decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Decoder<E>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Runs under a supervisor that restarts it after a panic or failure.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> IngesterHandle {
        let stats = self.stats();
        let restart_delay = self.config.restart_delay;
        let task_cancel = cancel.clone();
        let task = spawn_supervised(E::TOPIC, restart_delay, cancel, move || {
            let ingester = self.clone();
            let cancel = task_cancel.clone();
            async move { ingester.run(cancel).await }
        });
        IngesterHandle {
            topic: E::TOPIC,
            stats,
            task,
        }
    }

    /// Consumes until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the subscription cannot be established.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BusError> {
        let mut consumer = self
            .consumers
            .subscribe(E::TOPIC, &self.config.group_id)
            .await?;
        info!(topic = E::TOPIC, group_id = %self.config.group_id, "ingester subscribed");

        'ingest: loop {
            let first = tokio::select! {
                () = cancel.cancelled() => break 'ingest,
                polled = consumer.poll(None) => polled,
            };
            match first {
                Ok(Some(message)) => self.handle(consumer.as_mut(), message).await,
                Ok(None) => continue,
                Err(e) => {
                    warn!(topic = E::TOPIC, error = %e, "read failed, retrying");
                    tokio::select! {
                        () = cancel.cancelled() => break 'ingest,
                        () = tokio::time::sleep(self.config.read_retry_delay) => continue,
                    }
                }
            }

            loop {
                if cancel.is_cancelled() {
                    break 'ingest;
                }
                match consumer.poll(Some(Duration::ZERO)).await {
                    Ok(Some(message)) => self.handle(consumer.as_mut(), message).await,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(topic = E::TOPIC, error = %e, "read failed while draining");
                        break;
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break 'ingest,
                () = tokio::time::sleep(self.config.idle_interval) => {}
            }
        }

        info!(topic = E::TOPIC, "ingester stopped");
        Ok(())
    }

    async fn handle(&self, consumer: &mut dyn EventConsumer, message: Message) {
        match (self.decoder)(&message.payload) {
            Ok(envelope) => {
                let span = info_span!(
                    "apply_event",
                    topic = E::TOPIC,
                    event_id = %envelope.metadata.event_id,
                    correlation_id = %envelope.metadata.correlation_id,
                    offset = message.offset,
                );
                self.apply_or_dead_letter(&message, &envelope)
                    .instrument(span)
                    .await;
            }
            Err(e) => {
                warn!(
                    topic = E::TOPIC,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "skipping undecodable message"
                );
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Err(e) = consumer.commit(&message).await {
            warn!(topic = E::TOPIC, offset = message.offset, error = %e, "offset commit failed");
        }
    }

    async fn apply_or_dead_letter(&self, message: &Message, envelope: &EventEnvelope<E>) {
        let apply = &*self.apply;
        let result = (move || apply.apply(envelope))
            .retry(self.config.backoff())
            .when(DomainError::is_transient)
            .notify(|err: &DomainError, delay: Duration| {
                warn!(error = %err, delay = ?delay, "apply failed, retrying");
            })
            .await;

        match result {
            Ok(()) => {
                debug!("event applied");
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(error = %e, "event could not be applied, dead-lettering");
                if let Err(sink_err) = self.dead_letters.send(DeadLetter::new(message, &e)).await {
                    warn!(error = %sink_err, "dead-letter sink failed, message dropped");
                }
                self.stats.dead_lettered.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
