//! Backend selection: external services when configured, in-memory
//! implementations otherwise.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use bookstore_bus::{ConsumerFactory, EventProducer, InMemoryEventLog};
use bookstore_cache::{Cache, InMemoryCache, RedisCache};
use bookstore_core::model::Document;
use bookstore_core::repository::Repository;
use bookstore_discovery::{ConsulRegistry, InMemoryRegistry, Registry};
use bookstore_store::{InMemoryRepository, PgDocumentRepository, schema};

use crate::config::BackendConfig;
use crate::error::RuntimeError;

/// Both halves of the event log.
#[derive(Clone)]
pub struct EventBus {
    /// Shared producer.
    pub producer: Arc<dyn EventProducer>,
    /// Consumer factory for ingesters.
    pub consumers: Arc<dyn ConsumerFactory>,
}

impl EventBus {
    /// Wraps one in-memory log as producer and consumer factory.
    #[must_use]
    pub fn in_memory(log: &InMemoryEventLog) -> Self {
        Self {
            producer: Arc::new(log.clone()),
            consumers: Arc::new(log.clone()),
        }
    }
}

/// Consul when `registry_url` is set, otherwise a process-local registry.
///
/// # Errors
///
/// Returns `RuntimeError::Registry` if the Consul client cannot be built.
pub fn registry(config: &BackendConfig) -> Result<Arc<dyn Registry>, RuntimeError> {
    match &config.registry_url {
        Some(url) => Ok(Arc::new(ConsulRegistry::new(url)?)),
        None => {
            warn!("REGISTRY_URL not set; using an in-memory registry visible to this process only");
            Ok(Arc::new(InMemoryRegistry::new()))
        }
    }
}

/// Kafka when `kafka_uri` is set, otherwise a process-local log.
///
/// # Errors
///
/// Returns `RuntimeError::Bus` if the Kafka producer cannot be created, or
/// `RuntimeError::FeatureDisabled` if Kafka support is not compiled in.
pub fn event_bus(config: &BackendConfig) -> Result<EventBus, RuntimeError> {
    match &config.kafka_uri {
        Some(uri) => kafka_bus(uri),
        None => {
            warn!("KAFKA_URI not set; using an in-memory event log visible to this process only");
            Ok(EventBus::in_memory(&InMemoryEventLog::new()))
        }
    }
}

#[cfg(feature = "kafka")]
fn kafka_bus(uri: &str) -> Result<EventBus, RuntimeError> {
    use bookstore_bus::kafka::{KafkaConfig, KafkaConsumerFactory, KafkaProducer};

    let config = KafkaConfig::new(uri);
    Ok(EventBus {
        producer: Arc::new(KafkaProducer::new(&config)?),
        consumers: Arc::new(KafkaConsumerFactory::new(config)),
    })
}

#[cfg(not(feature = "kafka"))]
fn kafka_bus(_uri: &str) -> Result<EventBus, RuntimeError> {
    Err(RuntimeError::FeatureDisabled("kafka"))
}

/// Redis when `redis_uri` is set, otherwise a process-local cache.
///
/// # Errors
///
/// Returns `RuntimeError::Cache` if Redis is unreachable.
pub async fn cache(config: &BackendConfig) -> Result<Arc<dyn Cache>, RuntimeError> {
    match &config.redis_uri {
        Some(uri) => Ok(Arc::new(RedisCache::connect(uri).await?)),
        None => {
            info!("REDIS_URI not set; using an in-memory cache");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}

/// Connected and migrated pool when `database_url` is set.
///
/// # Errors
///
/// Returns `RuntimeError::Database` or `RuntimeError::Migration`.
pub async fn pg_pool(config: &BackendConfig) -> Result<Option<PgPool>, RuntimeError> {
    let Some(url) = &config.database_url else {
        info!("DATABASE_URL not set; using in-memory repositories");
        return Ok(None);
    };
    let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
    schema::run_migrations(&pool).await?;
    info!("connected to PostgreSQL and applied migrations");
    Ok(Some(pool))
}

/// Repository for `T` on `pool`, or in memory without one.
#[must_use]
pub fn repository<T: Document>(pool: Option<&PgPool>) -> Arc<dyn Repository<T>> {
    match pool {
        Some(pool) => Arc::new(PgDocumentRepository::<T>::new(pool.clone())),
        None => Arc::new(InMemoryRepository::<T>::new()),
    }
}
