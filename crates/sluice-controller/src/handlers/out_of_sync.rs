//! Repair of a replica that missed a seal
//!
//! The extent monitor raises this event when metadata marks an extent SEALED
//! but one store still reports it OPEN. The handler re-issues the seal to
//! that store only; metadata is already correct and is not touched.

use super::seal_extent_on_store;
use crate::context::Context;
use crate::directory::ServiceKind;
use crate::error::Result;
use crate::metadata::ExtentStatus;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// One store replica disagrees with the extent's metadata status
pub struct StoreExtentStatusOutOfSyncEvent {
    destination_id: String,
    extent_id: String,
    store_id: String,
    desired_status: ExtentStatus,
}

impl StoreExtentStatusOutOfSyncEvent {
    pub fn new(
        destination_id: impl Into<String>,
        extent_id: impl Into<String>,
        store_id: impl Into<String>,
        desired_status: ExtentStatus,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            extent_id: extent_id.into(),
            store_id: store_id.into(),
            desired_status,
        }
    }
}

#[async_trait]
impl Event for StoreExtentStatusOutOfSyncEvent {
    fn scope(&self) -> EventScope {
        EventScope::StoreExtentOutOfSync
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let addr = ctx
            .directory
            .resolve_uuid(ServiceKind::StoreHost, &self.store_id)
            .await?;

        if let Err(err) =
            seal_extent_on_store(ctx, &self.store_id, &addr, &self.extent_id, 0, false).await
        {
            ControllerMetrics::increment_failures(self.scope());
            error!(
                destination_id = %self.destination_id,
                extent_id = %self.extent_id,
                store_id = %self.store_id,
                desired_status = ?self.desired_status,
                error = %err,
                "seal retry on out-of-sync store failed"
            );
        }

        // Invalidate and release regardless of outcome so a down store does
        // not pin a tight retry loop; the monitor re-raises this event every
        // couple of minutes while the replica stays out of sync
        ctx.monitor
            .invalidate_store_extent_cache(&self.store_id, &self.extent_id);
        ctx.seals.in_progress.remove(&self.extent_id);

        Ok(())
    }
}
