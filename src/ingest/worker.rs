//! Partition-sequential event consumers.
//!
//! One task per partition, each draining its receiver in order, so events
//! for the same corp code (same key, same partition) are applied in arrival
//! order. Across partitions there is no ordering. Failed events are logged
//! and acknowledged; redelivery is the bus's concern.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::coordinator::IngestionCoordinator;
use crate::bus::{EventSubscriber, PartnerEvent};
use crate::config::BusConfig;

pub struct IngestWorker {
    coordinator: Arc<IngestionCoordinator>,
}

impl IngestWorker {
    pub fn new(coordinator: Arc<IngestionCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Subscribe to the partner topic and spawn one sequential consumer per
    /// partition. Returns the task handles so the caller can await or abort.
    pub fn spawn_partner_consumers(
        &self,
        bus: &dyn EventSubscriber,
        config: &BusConfig,
    ) -> Vec<JoinHandle<()>> {
        let receivers = bus.subscribe(&config.partner_company_topic, &config.consumer_group_id);
        info!(
            "Partner consumer group {} attached: topic={}, partitions={}",
            config.consumer_group_id,
            config.partner_company_topic,
            receivers.len()
        );

        receivers
            .into_iter()
            .enumerate()
            .map(|(partition, mut rx)| {
                let coordinator = Arc::clone(&self.coordinator);
                tokio::spawn(async move {
                    while let Some(record) = rx.recv().await {
                        match serde_json::from_value::<PartnerEvent>(record.payload.clone()) {
                            Ok(event) => coordinator.handle_event(&event).await,
                            Err(e) => error!(
                                "Undecodable partner event, acknowledging: partition={}, offset={}, error={}",
                                record.partition, record.offset, e
                            ),
                        }
                    }
                    info!("Partner consumer for partition {} stopped", partition);
                })
            })
            .collect()
    }

    /// Attach the legacy company-profile and disclosure topics. Their
    /// payloads are acknowledged without further processing.
    pub fn spawn_legacy_consumers(
        &self,
        bus: &dyn EventSubscriber,
        config: &BusConfig,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for topic in [&config.company_profile_topic, &config.disclosure_topic] {
            for mut rx in bus.subscribe(topic, &config.consumer_group_id) {
                let topic = topic.clone();
                handles.push(tokio::spawn(async move {
                    while let Some(record) = rx.recv().await {
                        info!(
                            "Message received on {}: key={}, offset={}",
                            topic, record.key, record.offset
                        );
                    }
                }));
            }
        }
        handles
    }
}
