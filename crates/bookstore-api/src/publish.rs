//! The gateway write path: envelope, publish, bounded flush, invalidation.

use std::time::Duration;

use axum::http::StatusCode;
use tracing::{info, warn};
use uuid::Uuid;

use bookstore_bus::Record;
use bookstore_cache::Namespace;
use bookstore_cache::read_through::invalidate_namespace;
use bookstore_core::error::DomainError;
use bookstore_core::event::{DomainEvent, EventEnvelope};

use crate::state::AppState;

/// Longest a write waits for the producer to deliver.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Publishes `event` and drops every cached read in `invalidates`.
///
/// A failed publish rejects the write. A flush timeout and a failed
/// invalidation are logged and the write is still accepted.
///
/// # Errors
///
/// Returns the producer's error, mapped to `DomainError`, when the event
/// could not be published.
pub async fn publish_event<E: DomainEvent>(
    state: &AppState,
    event: E,
    correlation_id: Uuid,
    invalidates: Option<Namespace>,
) -> Result<StatusCode, DomainError> {
    let key = event.partition_key();
    let envelope = EventEnvelope::new(event, correlation_id, state.clock.as_ref());
    let event_id = envelope.metadata.event_id;
    let record = Record {
        topic: E::TOPIC.to_owned(),
        key,
        payload: envelope.to_bytes()?,
    };

    state.producer.publish(record).await?;
    if let Err(e) = state.producer.flush(FLUSH_TIMEOUT).await {
        warn!(topic = E::TOPIC, %event_id, error = %e, "event not confirmed within flush timeout");
    }
    info!(topic = E::TOPIC, %event_id, %correlation_id, "event published");

    if let Some(namespace) = invalidates {
        if let Err(e) = invalidate_namespace(state.cache.as_ref(), namespace).await {
            warn!(%namespace, error = %e, "cache invalidation failed");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bookstore_cache::{Cache, CacheKey, InMemoryCache};
    use bookstore_core::event::{CreateBook, DeleteBook};
    use bookstore_test_support::{FailingCache, FailingProducer, RecordingProducer};

    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_publish_keys_by_entity_and_invalidates_namespace() {
        // Arrange
        let producer = Arc::new(RecordingProducer::new());
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(CacheKey::book("b-1").as_str(), b"{}".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set(CacheKey::author_list().as_str(), b"[]".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        let state = testing::state(producer.clone(), cache.clone());

        // Act
        let status = publish_event(
            &state,
            DeleteBook {
                id: "b-1".to_owned(),
            },
            Uuid::new_v4(),
            Some(Namespace::Books),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        let published = producer.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "deleteBook");
        assert_eq!(published[0].key.as_deref(), Some("b-1"));
        let envelope = EventEnvelope::<DeleteBook>::from_slice(&published[0].payload).unwrap();
        assert_eq!(envelope.metadata.occurred_at, testing::now());
        assert_eq!(producer.flushes(), 1);
        assert!(cache.get(CacheKey::book("b-1").as_str()).await.unwrap().is_none());
        assert!(cache.get(CacheKey::author_list().as_str()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_publish_failure_rejects_write() {
        let state = testing::state(Arc::new(FailingProducer), Arc::new(InMemoryCache::new()));

        let result = publish_event(&state, CreateBook::default(), Uuid::new_v4(), None).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_cache_outage_does_not_fail_write() {
        let producer = Arc::new(RecordingProducer::new());
        let state = testing::state(producer.clone(), Arc::new(FailingCache));

        let status = publish_event(
            &state,
            CreateBook::default(),
            Uuid::new_v4(),
            Some(Namespace::Books),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(producer.published().len(), 1);
        assert_eq!(producer.published()[0].key, None);
    }
}
