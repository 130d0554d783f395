//! Kafka backend built on `rdkafka`.
//!
//! Offsets are committed explicitly (`enable.auto.commit=false`) so a record
//! is only acknowledged after the ingester has applied, skipped or
//! dead-lettered it.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message as KafkaMessage;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info};

use crate::{BusError, ConsumerFactory, EventConsumer, EventProducer, Message, Record};

/// How long a single send may wait in the local producer queue.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings shared by producers and consumers.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated `host:port` list.
    pub bootstrap_servers: String,
}

impl KafkaConfig {
    /// Creates a config for the given bootstrap servers.
    #[must_use]
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
        }
    }

    fn producer_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.bootstrap_servers);
        config.set("message.timeout.ms", "5000");
        config.set("acks", "all");
        config
    }

    fn consumer_config(&self, group_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.bootstrap_servers);
        config.set("group.id", group_id);
        config.set("enable.auto.commit", "false");
        config.set("auto.offset.reset", "earliest");
        config
    }
}

/// Pooled producer; clones share one connection.
#[derive(Clone)]
pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    /// Connects a producer.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Connection` if the client cannot be created.
    pub fn new(config: &KafkaConfig) -> Result<Self, BusError> {
        let producer: FutureProducer = config
            .producer_config()
            .create()
            .map_err(|e| BusError::Connection(format!("failed to create Kafka producer: {e}")))?;

        info!(bootstrap_servers = %config.bootstrap_servers, "connected Kafka producer");
        Ok(Self { producer })
    }
}

#[async_trait]
impl EventProducer for KafkaProducer {
    async fn publish(&self, record: Record) -> Result<(), BusError> {
        let mut kafka_record = FutureRecord::to(&record.topic).payload(&record.payload);
        if let Some(key) = &record.key {
            kafka_record = kafka_record.key(key);
        }

        let (partition, offset) = self
            .producer
            .send(kafka_record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| BusError::Publish(e.to_string()))?;

        debug!(topic = %record.topic, partition, offset, "published record");
        Ok(())
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BusError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| BusError::Publish(format!("flush task failed: {e}")))?
            .map_err(|_| BusError::FlushTimeout(timeout))
    }
}

/// Creates one `StreamConsumer` per subscription.
#[derive(Debug, Clone)]
pub struct KafkaConsumerFactory {
    config: KafkaConfig,
}

impl KafkaConsumerFactory {
    /// Creates a factory for the given cluster.
    #[must_use]
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConsumerFactory for KafkaConsumerFactory {
    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Box<dyn EventConsumer>, BusError> {
        let consumer: StreamConsumer = self
            .config
            .consumer_config(group_id)
            .create()
            .map_err(|e| BusError::Connection(format!("failed to create Kafka consumer: {e}")))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| BusError::Subscribe(format!("failed to subscribe to {topic}: {e}")))?;

        info!(topic, group_id, "subscribed Kafka consumer");
        Ok(Box::new(KafkaConsumer {
            consumer,
            topic: topic.to_owned(),
        }))
    }
}

/// A group member bound to one topic.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

#[async_trait]
impl EventConsumer for KafkaConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn poll(&mut self, timeout: Option<Duration>) -> Result<Option<Message>, BusError> {
        let received = match timeout {
            None => self.consumer.recv().await,
            Some(timeout) => match tokio::time::timeout(timeout, self.consumer.recv()).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            },
        };
        let message = received.map_err(|e| BusError::Consume(e.to_string()))?;

        Ok(Some(Message {
            topic: message.topic().to_owned(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|key| String::from_utf8_lossy(key).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }

    async fn commit(&mut self, message: &Message) -> Result<(), BusError> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset + 1),
            )
            .map_err(|e| BusError::Commit(e.to_string()))?;
        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| BusError::Commit(e.to_string()))
    }
}
