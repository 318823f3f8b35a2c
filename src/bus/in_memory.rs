//! In-memory durable-log event bus.
//!
//! The bus keeps an append-only log per (topic, partition) and fans records
//! out to consumer-group channels. Subscribing replays the retained log from
//! offset zero before live delivery, which gives tests and local runs the
//! same at-least-once, per-key-ordered semantics a broker-backed deployment
//! would provide. Records are partitioned by key hash so one corp code
//! always serializes through one partition.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One delivered record.
#[derive(Debug, Clone)]
pub struct BusRecord {
    pub topic: String,
    pub partition: usize,
    pub offset: u64,
    pub key: String,
    pub payload: serde_json::Value,
}

/// Producer side of the bus contract.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<()>;
}

/// Consumer side: one receiver per partition; each partition must be
/// processed strictly sequentially by its consumer.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, topic: &str, group: &str) -> Vec<mpsc::UnboundedReceiver<BusRecord>>;
}

struct TopicState {
    /// Append-only log per partition.
    logs: Vec<Vec<BusRecord>>,
    /// Live senders per consumer group, one per partition.
    groups: HashMap<String, Vec<mpsc::UnboundedSender<BusRecord>>>,
}

impl TopicState {
    fn new(partitions: usize) -> Self {
        Self {
            logs: (0..partitions).map(|_| Vec::new()).collect(),
            groups: HashMap::new(),
        }
    }
}

pub struct InMemoryBus {
    partitions: usize,
    topics: Mutex<HashMap<String, TopicState>>,
}

impl InMemoryBus {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.partitions
    }
}

#[async_trait]
impl EventPublisher for InMemoryBus {
    async fn publish(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<()> {
        let partition = self.partition_for(key);
        let mut topics = self.topics.lock().unwrap();
        let partitions = self.partitions;
        let state = topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicState::new(partitions));

        let offset = state.logs[partition].len() as u64;
        let record = BusRecord {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_string(),
            payload,
        };

        state.logs[partition].push(record.clone());
        debug!(
            "Published record: topic={}, partition={}, offset={}, key={}",
            topic, partition, offset, key
        );

        for (group, senders) in &state.groups {
            if senders[partition].send(record.clone()).is_err() {
                warn!(
                    "Consumer group {} dropped its receiver for {}[{}]",
                    group, topic, partition
                );
            }
        }

        Ok(())
    }
}

impl EventSubscriber for InMemoryBus {
    fn subscribe(&self, topic: &str, group: &str) -> Vec<mpsc::UnboundedReceiver<BusRecord>> {
        let mut topics = self.topics.lock().unwrap();
        let partitions = self.partitions;
        let state = topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicState::new(partitions));

        let mut senders = Vec::with_capacity(partitions);
        let mut receivers = Vec::with_capacity(partitions);
        for partition in 0..partitions {
            let (tx, rx) = mpsc::unbounded_channel();
            // Replay the retained log so a late subscriber still sees every
            // record at least once.
            for record in &state.logs[partition] {
                let _ = tx.send(record.clone());
            }
            senders.push(tx);
            receivers.push(rx);
        }

        state.groups.insert(group.to_string(), senders);
        debug!(
            "Consumer group {} subscribed to {} ({} partitions)",
            group, topic, partitions
        );
        receivers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn same_key_lands_in_one_partition_in_order() {
        let bus = InMemoryBus::new(3);
        for i in 0..5 {
            bus.publish("partner-company-events", "00126380", json!({ "seq": i }))
                .await
                .unwrap();
        }

        let mut receivers = bus.subscribe("partner-company-events", "eds-sync");
        let mut seen = Vec::new();
        for rx in &mut receivers {
            while let Ok(record) = rx.try_recv() {
                seen.push(record);
            }
        }

        assert_eq!(seen.len(), 5);
        let partition = seen[0].partition;
        for (i, record) in seen.iter().enumerate() {
            assert_eq!(record.partition, partition);
            assert_eq!(record.payload["seq"], i as i64);
        }
    }

    #[tokio::test]
    async fn late_subscriber_replays_the_log() {
        let bus = InMemoryBus::new(2);
        bus.publish("t", "a", json!({"n": 1})).await.unwrap();

        let mut receivers = bus.subscribe("t", "g1");
        bus.publish("t", "a", json!({"n": 2})).await.unwrap();

        let mut seen = Vec::new();
        for rx in &mut receivers {
            while let Ok(record) = rx.try_recv() {
                seen.push(record.payload["n"].as_i64().unwrap());
            }
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn each_group_receives_every_record() {
        let bus = InMemoryBus::new(2);
        let mut g1 = bus.subscribe("t", "g1");
        let mut g2 = bus.subscribe("t", "g2");
        bus.publish("t", "key", json!({"x": true})).await.unwrap();

        let drain = |receivers: &mut Vec<mpsc::UnboundedReceiver<BusRecord>>| {
            let mut n = 0;
            for rx in receivers {
                while rx.try_recv().is_ok() {
                    n += 1;
                }
            }
            n
        };
        assert_eq!(drain(&mut g1), 1);
        assert_eq!(drain(&mut g2), 1);
    }
}
