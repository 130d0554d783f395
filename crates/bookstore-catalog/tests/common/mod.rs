//! Shared test helpers for catalog integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bookstore_bus::{EventProducer, InMemoryEventLog, Record};
use bookstore_catalog::CatalogService;
use bookstore_catalog::server::{GROUP_ID, ingester_config};
use bookstore_core::event::{DomainEvent, EventEnvelope};
use bookstore_core::model::{Author, Book};
use bookstore_ingester::{IngestCounts, IngesterConfig, IngesterHandle};
use bookstore_runtime::config::IngestSettings;
use bookstore_store::InMemoryRepository;
use bookstore_test_support::FixedClock;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Catalog service over fresh in-memory repositories.
pub fn in_memory_service() -> Arc<CatalogService> {
    Arc::new(CatalogService::new(
        Arc::new(InMemoryRepository::<Author>::new()),
        Arc::new(InMemoryRepository::<Book>::new()),
    ))
}

/// Ingester tuning that keeps tests fast.
pub fn fast_config() -> IngesterConfig {
    IngesterConfig {
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        read_retry_delay: Duration::from_millis(5),
        restart_delay: Duration::from_millis(5),
        ..ingester_config(IngestSettings {
            idle_interval: Duration::from_millis(5),
            max_attempts: 3,
        })
    }
}

/// Wraps `event` in an envelope and appends it to its topic.
pub async fn publish<E: DomainEvent>(log: &InMemoryEventLog, event: E) {
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
    let key = event.partition_key();
    let envelope = EventEnvelope::new(event, Uuid::new_v4(), &clock);
    log.publish(Record {
        topic: E::TOPIC.to_owned(),
        key,
        payload: envelope.to_bytes().unwrap(),
    })
    .await
    .unwrap();
}

/// Waits until the ingester for `topic` has handled `count` messages.
pub async fn wait_for(handles: &[IngesterHandle], topic: &str, count: u64) -> IngestCounts {
    let handle = handles
        .iter()
        .find(|h| h.topic == topic)
        .unwrap_or_else(|| panic!("no ingester for {topic}"));
    for _ in 0..1000 {
        let counts = handle.stats.snapshot();
        if counts.handled() >= count {
            return counts;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "ingester for {topic} handled only {:?}, expected {count}",
        handle.stats.snapshot()
    );
}

/// Lag of the catalog consumer group on `topic`.
pub fn lag(log: &InMemoryEventLog, topic: &str) -> usize {
    log.lag(topic, GROUP_ID)
}
