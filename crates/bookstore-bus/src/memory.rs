//! In-memory partitioned event log.
//!
//! Mirrors the subset of Kafka semantics the services rely on: keyed records
//! keep their order within a partition, each consumer group tracks committed
//! offsets per partition, partitions are spread across the live members of a
//! group, and any membership change rewinds members to the committed offsets
//! so uncommitted records are delivered again.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use crate::{BusError, ConsumerFactory, EventConsumer, EventProducer, Message, Record};

/// Partition count used by [`InMemoryEventLog::new`].
pub const DEFAULT_PARTITIONS: usize = 3;

/// Process-local event log shared by producers and consumers through cheap
/// clones.
#[derive(Debug, Clone)]
pub struct InMemoryEventLog {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    partitions: usize,
    state: Mutex<LogState>,
    changed: Notify,
    round_robin: AtomicUsize,
}

#[derive(Debug, Default)]
struct LogState {
    topics: HashMap<String, TopicLog>,
    next_member: u64,
}

#[derive(Debug)]
struct TopicLog {
    partitions: Vec<Vec<Entry>>,
    groups: HashMap<String, Group>,
}

#[derive(Debug)]
struct Entry {
    key: Option<String>,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct Group {
    /// Next offset to deliver after a rebalance, per partition.
    committed: Vec<usize>,
    members: Vec<u64>,
    generation: u64,
}

fn partition_id(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn offset_id(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventLog {
    /// Creates a log with [`DEFAULT_PARTITIONS`] partitions per topic.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Creates a log with `partitions` partitions per topic (at least one).
    #[must_use]
    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                partitions: partitions.max(1),
                state: Mutex::new(LogState::default()),
                changed: Notify::new(),
                round_robin: AtomicUsize::new(0),
            }),
        }
    }

    /// Every record currently on `topic`, partition by partition.
    #[must_use]
    pub fn messages(&self, topic: &str) -> Vec<Message> {
        let state = self.shared.lock();
        let Some(log) = state.topics.get(topic) else {
            return Vec::new();
        };
        log.partitions
            .iter()
            .enumerate()
            .flat_map(|(partition, entries)| {
                entries
                    .iter()
                    .enumerate()
                    .map(move |(offset, entry)| entry.to_message(topic, partition, offset))
            })
            .collect()
    }

    /// Records on `topic` not yet committed by `group_id`.
    #[must_use]
    pub fn lag(&self, topic: &str, group_id: &str) -> usize {
        let state = self.shared.lock();
        let Some(log) = state.topics.get(topic) else {
            return 0;
        };
        log.partitions
            .iter()
            .enumerate()
            .map(|(partition, entries)| {
                let committed = log
                    .groups
                    .get(group_id)
                    .map_or(0, |group| group.committed[partition]);
                entries.len().saturating_sub(committed)
            })
            .sum()
    }
}

impl Entry {
    fn to_message(&self, topic: &str, partition: usize, offset: usize) -> Message {
        Message {
            topic: topic.to_owned(),
            partition: partition_id(partition),
            offset: offset_id(offset),
            key: self.key.clone(),
            payload: self.payload.clone(),
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn partition_for(&self, key: Option<&str>) -> usize {
        match key {
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                // Modulo first so the narrowing conversion is lossless.
                usize::try_from(hasher.finish() % self.partitions as u64).unwrap_or(0)
            }
            None => self.round_robin.fetch_add(1, Ordering::Relaxed) % self.partitions,
        }
    }

    fn join(&self, topic: &str, group_id: &str) -> u64 {
        let member = {
            let mut state = self.lock();
            let member = state.next_member;
            state.next_member += 1;
            let partitions = self.partitions;
            let log = state
                .topics
                .entry(topic.to_owned())
                .or_insert_with(|| TopicLog::new(partitions));
            let group = log
                .groups
                .entry(group_id.to_owned())
                .or_insert_with(|| Group {
                    committed: vec![0; partitions],
                    members: Vec::new(),
                    generation: 0,
                });
            group.members.push(member);
            group.generation += 1;
            debug!(topic, group_id, member, members = group.members.len(), "consumer joined group");
            member
        };
        self.changed.notify_waiters();
        member
    }

    fn leave(&self, topic: &str, group_id: &str, member: u64) {
        {
            let mut state = self.lock();
            if let Some(group) = state
                .topics
                .get_mut(topic)
                .and_then(|log| log.groups.get_mut(group_id))
            {
                group.members.retain(|m| *m != member);
                group.generation += 1;
                debug!(topic, group_id, member, members = group.members.len(), "consumer left group");
            }
        }
        self.changed.notify_waiters();
    }
}

impl TopicLog {
    fn new(partitions: usize) -> Self {
        Self {
            partitions: (0..partitions).map(|_| Vec::new()).collect(),
            groups: HashMap::new(),
        }
    }
}

#[async_trait]
impl EventProducer for InMemoryEventLog {
    async fn publish(&self, record: Record) -> Result<(), BusError> {
        let partition = self.shared.partition_for(record.key.as_deref());
        {
            let mut state = self.shared.lock();
            let partitions = self.shared.partitions;
            let log = state
                .topics
                .entry(record.topic.clone())
                .or_insert_with(|| TopicLog::new(partitions));
            log.partitions[partition].push(Entry {
                key: record.key,
                payload: record.payload,
            });
        }
        self.shared.changed.notify_waiters();
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), BusError> {
        // Appends are synchronous; nothing is ever pending.
        Ok(())
    }
}

#[async_trait]
impl ConsumerFactory for InMemoryEventLog {
    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
    ) -> Result<Box<dyn EventConsumer>, BusError> {
        let member = self.shared.join(topic, group_id);
        Ok(Box::new(InMemoryConsumer {
            shared: Arc::clone(&self.shared),
            topic: topic.to_owned(),
            group_id: group_id.to_owned(),
            member,
            generation: 0,
            cursors: Vec::new(),
            next_slot: 0,
        }))
    }
}

/// Group member returned by [`InMemoryEventLog::subscribe`](ConsumerFactory::subscribe).
/// Dropping it leaves the group.
#[derive(Debug)]
pub struct InMemoryConsumer {
    shared: Arc<Shared>,
    topic: String,
    group_id: String,
    member: u64,
    generation: u64,
    /// `(partition, next offset)` for every partition assigned to this member.
    cursors: Vec<(usize, usize)>,
    next_slot: usize,
}

impl InMemoryConsumer {
    fn try_next(&mut self) -> Option<Message> {
        let shared = Arc::clone(&self.shared);
        let state = shared.lock();
        let log = state.topics.get(&self.topic)?;
        let group = log.groups.get(&self.group_id)?;

        if group.generation != self.generation {
            self.generation = group.generation;
            let members = group.members.len();
            self.cursors = match group.members.iter().position(|m| *m == self.member) {
                Some(index) => (0..log.partitions.len())
                    .filter(|partition| partition % members == index)
                    .map(|partition| (partition, group.committed[partition]))
                    .collect(),
                None => Vec::new(),
            };
            self.next_slot = 0;
            debug!(
                topic = %self.topic,
                group_id = %self.group_id,
                member = self.member,
                assigned = ?self.cursors.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
                "partitions assigned"
            );
        }

        let slots = self.cursors.len();
        for step in 0..slots {
            let slot = (self.next_slot + step) % slots;
            let (partition, offset) = self.cursors[slot];
            if let Some(entry) = log.partitions[partition].get(offset) {
                self.cursors[slot].1 = offset + 1;
                self.next_slot = (slot + 1) % slots;
                return Some(entry.to_message(&self.topic, partition, offset));
            }
        }
        None
    }
}

#[async_trait]
impl EventConsumer for InMemoryConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn poll(&mut self, timeout: Option<Duration>) -> Result<Option<Message>, BusError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let shared = Arc::clone(&self.shared);
        loop {
            // Register interest before checking so an append between the
            // check and the wait is not missed.
            let changed = shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if let Some(message) = self.try_next() {
                return Ok(Some(message));
            }

            match deadline {
                None => changed.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, changed).await.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn commit(&mut self, message: &Message) -> Result<(), BusError> {
        let partition = usize::try_from(message.partition)
            .map_err(|_| BusError::Commit(format!("invalid partition {}", message.partition)))?;
        let next = usize::try_from(message.offset)
            .map_err(|_| BusError::Commit(format!("invalid offset {}", message.offset)))?
            + 1;

        let mut state = self.shared.lock();
        let committed = state
            .topics
            .get_mut(&self.topic)
            .and_then(|log| log.groups.get_mut(&self.group_id))
            .and_then(|group| group.committed.get_mut(partition))
            .ok_or_else(|| {
                BusError::Commit(format!("unknown partition {partition} on {}", self.topic))
            })?;
        *committed = (*committed).max(next);
        Ok(())
    }
}

impl Drop for InMemoryConsumer {
    fn drop(&mut self) {
        self.shared.leave(&self.topic, &self.group_id, self.member);
    }
}
