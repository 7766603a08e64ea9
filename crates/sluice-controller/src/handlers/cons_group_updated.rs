//! Reaction to a consumer group gaining an extent

use super::{reasons, OutputHostNotificationEvent};
use crate::context::Context;
use crate::error::Result;
use crate::metadata::ConsumerGroupExtentStatus;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use sluice_protocol::NotificationType;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// A new extent became consumable by a consumer group
///
/// The newly assigned output host gets a full reload notice; every other
/// output host with an OPEN extent for the group gets a client reconfigure.
pub struct ConsGroupUpdatedEvent {
    destination_id: String,
    consumer_group_id: String,
    extent_id: String,
    output_host_id: String,
}

impl ConsGroupUpdatedEvent {
    pub fn new(
        destination_id: impl Into<String>,
        consumer_group_id: impl Into<String>,
        extent_id: impl Into<String>,
        output_host_id: impl Into<String>,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            consumer_group_id: consumer_group_id.into(),
            extent_id: extent_id.into(),
            output_host_id: output_host_id.into(),
        }
    }
}

#[async_trait]
impl Event for ConsGroupUpdatedEvent {
    fn scope(&self) -> EventScope {
        EventScope::ConsGroupUpdated
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let mut output_hosts: HashSet<String> = HashSet::new();
        output_hosts.insert(self.output_host_id.clone());

        match ctx
            .metadata
            .list_extents_by_consumer_group(
                &self.destination_id,
                &self.consumer_group_id,
                &[ConsumerGroupExtentStatus::Open],
            )
            .await
        {
            Ok(cg_extents) => {
                for cge in cg_extents {
                    output_hosts.insert(cge.output_host_id);
                }
            }
            Err(err) => {
                ControllerMetrics::increment_metadata_read_errors(self.scope());
                debug!(
                    consumer_group_id = %self.consumer_group_id,
                    error = %err,
                    "listing consumer-group extents failed, notifying assigned host only"
                );
            }
        }

        let notify = OutputHostNotificationEvent::new(
            &self.destination_id,
            &self.consumer_group_id,
            &self.output_host_id,
            reasons::CG_EXT_UPDATED,
            &self.extent_id,
            NotificationType::All,
        );
        if !ctx.queue.add(Box::new(notify)) {
            error!(
                consumer_group_id = %self.consumer_group_id,
                output_host_id = %self.output_host_id,
                extent_id = %self.extent_id,
                "failed to enqueue output-host notification"
            );
        }

        output_hosts.remove(&self.output_host_id);

        for host_id in output_hosts {
            let notify = OutputHostNotificationEvent::new(
                &self.destination_id,
                &self.consumer_group_id,
                &host_id,
                reasons::CG_EXT_UPDATED,
                &self.extent_id,
                NotificationType::Client,
            );
            if !ctx.queue.add(Box::new(notify)) {
                error!(
                    consumer_group_id = %self.consumer_group_id,
                    output_host_id = %host_id,
                    extent_id = %self.extent_id,
                    "failed to enqueue output-host notification"
                );
            }
        }

        Ok(())
    }
}
