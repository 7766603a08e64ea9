//! Reaction to a newly created extent
//!
//! A new OPEN extent changes the answer every input host should give its
//! publishing clients, so the originating host gets a full reload notice and
//! every other input host serving the destination gets a client reconfigure.
//! Consumers are reconfigured through the output-host fan-out.

use super::{reasons, reconfigure_all_consumers, InputHostNotificationEvent};
use crate::context::Context;
use crate::error::Result;
use crate::metadata::ExtentStatus;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use sluice_protocol::NotificationType;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

/// A new OPEN extent was written to metadata
pub struct ExtentCreatedEvent {
    destination_id: String,
    input_host_id: String,
    extent_id: String,
    store_ids: Vec<String>,
}

impl ExtentCreatedEvent {
    pub fn new(
        destination_id: impl Into<String>,
        input_host_id: impl Into<String>,
        extent_id: impl Into<String>,
        store_ids: Vec<String>,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            input_host_id: input_host_id.into(),
            extent_id: extent_id.into(),
            store_ids,
        }
    }
}

#[async_trait]
impl Event for ExtentCreatedEvent {
    fn scope(&self) -> EventScope {
        EventScope::ExtentCreated
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let mut input_hosts: HashSet<String> = HashSet::new();
        input_hosts.insert(self.input_host_id.clone());

        match ctx
            .metadata
            .list_extents_by_dst_status(&self.destination_id, &[ExtentStatus::Open])
            .await
        {
            Ok(stats) => {
                for stat in stats {
                    input_hosts.insert(stat.extent.input_host_id);
                }
            }
            Err(err) => {
                ControllerMetrics::increment_metadata_read_errors(self.scope());
                error!(
                    destination_id = %self.destination_id,
                    error = %err,
                    "listing open extents failed, not all input hosts can be notified about new extent"
                );
            }
        }

        let notify = InputHostNotificationEvent::new(
            &self.destination_id,
            &self.input_host_id,
            &self.extent_id,
            self.store_ids.clone(),
            reasons::EXTENT_CREATED,
            &self.extent_id,
            NotificationType::All,
        );
        if !ctx.queue.add(Box::new(notify)) {
            ControllerMetrics::increment_failures(self.scope());
            error!(
                extent_id = %self.extent_id,
                input_host_id = %self.input_host_id,
                "failed to enqueue input-host notification"
            );
            return Ok(());
        }

        input_hosts.remove(&self.input_host_id);

        for host_id in input_hosts {
            let notify = InputHostNotificationEvent::new(
                &self.destination_id,
                &host_id,
                &self.extent_id,
                self.store_ids.clone(),
                reasons::EXTENT_CREATED,
                &self.extent_id,
                NotificationType::Client,
            );
            if !ctx.queue.add(Box::new(notify)) {
                ControllerMetrics::increment_failures(self.scope());
                error!(
                    extent_id = %self.extent_id,
                    input_host_id = %host_id,
                    "failed to enqueue input-host notification"
                );
            }
        }

        reconfigure_all_consumers(
            ctx,
            &self.destination_id,
            &self.extent_id,
            reasons::EXTENT_CREATED,
            &self.extent_id,
            self.scope(),
        )
        .await;

        Ok(())
    }
}
