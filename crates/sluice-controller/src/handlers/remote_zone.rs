//! Replication kickoff for extents created in another zone
//!
//! The first store in the replica set is the primary: it pulls the extent
//! from its origin zone. Each remaining store then re-replicates from the
//! primary, in order. Any failure returns the error so a retry re-runs the
//! whole sequence; both store-side operations are idempotent by
//! `(extent_id, source)`, so re-starting the primary or an already-running
//! secondary is safe.

use crate::clients::{with_deadline, StoreClientLease};
use crate::context::Context;
use crate::directory::ServiceKind;
use crate::error::Result;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use sluice_protocol::{RemoteReplicateExtentRequest, ReplicateExtentRequest};
use std::sync::Arc;
use tracing::{error, warn};

/// An extent originating in a remote zone was created locally
pub struct RemoteZoneExtentCreatedEvent {
    destination_id: String,
    extent_id: String,
    store_ids: Vec<String>,
}

impl RemoteZoneExtentCreatedEvent {
    pub fn new(
        destination_id: impl Into<String>,
        extent_id: impl Into<String>,
        store_ids: Vec<String>,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            extent_id: extent_id.into(),
            store_ids,
        }
    }
}

#[async_trait]
impl Event for RemoteZoneExtentCreatedEvent {
    fn scope(&self) -> EventScope {
        EventScope::RemoteZoneExtentCreated
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let Some(primary_id) = self.store_ids.first().cloned() else {
            warn!(
                extent_id = %self.extent_id,
                "remote extent has no replica set, nothing to replicate"
            );
            return Ok(());
        };

        let deadline = ctx.config.rpc.replicate;

        let primary_addr = ctx
            .directory
            .resolve_uuid(ServiceKind::StoreHost, &primary_id)
            .await?;

        {
            let primary = match StoreClientLease::acquire(&ctx.clients, &primary_addr, &primary_id)
            {
                Ok(lease) => lease,
                Err(err) => {
                    ControllerMetrics::increment_client_create_errors(self.scope());
                    error!(
                        extent_id = %self.extent_id,
                        store_id = %primary_id,
                        error = %err,
                        "client factory failed to vend store client"
                    );
                    return Err(err.into());
                }
            };

            let req = RemoteReplicateExtentRequest {
                destination_id: self.destination_id.clone(),
                extent_id: self.extent_id.clone(),
            };
            if let Err(err) =
                with_deadline(deadline, primary.client().remote_replicate_extent(req)).await
            {
                error!(
                    extent_id = %self.extent_id,
                    store_id = %primary_id,
                    error = %err,
                    "remote replicate call on primary store failed"
                );
                return Err(err.into());
            }
        }

        for secondary_id in self.store_ids.iter().skip(1) {
            let addr = ctx
                .directory
                .resolve_uuid(ServiceKind::StoreHost, secondary_id)
                .await?;

            let secondary = match StoreClientLease::acquire(&ctx.clients, &addr, secondary_id) {
                Ok(lease) => lease,
                Err(err) => {
                    ControllerMetrics::increment_client_create_errors(self.scope());
                    error!(
                        extent_id = %self.extent_id,
                        store_id = %secondary_id,
                        error = %err,
                        "client factory failed to vend store client"
                    );
                    return Err(err.into());
                }
            };

            let req = ReplicateExtentRequest {
                destination_id: self.destination_id.clone(),
                extent_id: self.extent_id.clone(),
                source_store_id: primary_id.clone(),
            };
            if let Err(err) = with_deadline(deadline, secondary.client().replicate_extent(req)).await
            {
                error!(
                    extent_id = %self.extent_id,
                    store_id = %secondary_id,
                    error = %err,
                    "replicate call on secondary store failed"
                );
                return Err(err.into());
            }
        }

        Ok(())
    }
}
