//! Shared test helpers for auth integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bookstore_auth::AuthService;
use bookstore_auth::model::UserRecord;
use bookstore_auth::password::Passwords;
use bookstore_auth::server::ingester_config;
use bookstore_bus::{EventProducer, InMemoryEventLog, Record};
use bookstore_core::event::{CreateUser, DomainEvent, EventEnvelope};
use bookstore_ingester::{IngestCounts, IngesterConfig, IngesterHandle};
use bookstore_runtime::config::IngestSettings;
use bookstore_store::InMemoryRepository;
use bookstore_test_support::FixedClock;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Auth service over an empty in-memory store, with `admins` as admins.
pub fn in_memory_service(admins: &[&str]) -> Arc<AuthService> {
    Arc::new(
        AuthService::new(
            Arc::new(InMemoryRepository::<UserRecord>::new()),
            Passwords::low_cost().unwrap(),
        )
        .with_admins(admins.iter().map(|name| (*name).to_owned()).collect()),
    )
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

/// A registration for `username` with password `secret`.
pub fn registration(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_owned(),
        password: "secret".to_owned(),
        email: format!("{username}@example.com"),
        first_name: None,
        last_name: None,
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
