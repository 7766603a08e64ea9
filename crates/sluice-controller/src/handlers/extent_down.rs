//! The seal state machine
//!
//! Sealing reconciles distributed state under partial failure: every healthy
//! replica is asked to seal in parallel, one success is enough for
//! correctness (store-level sealing is idempotent), and the metadata write
//! tolerates a concurrent controller having already advanced the record.
//!
//! The event carries its position in the machine across pipeline retries, so
//! a retryable failure resumes where it left off instead of starting over.
//! Whether this is a first attempt or a retry re-entry picks the rate-limiter
//! acquisition mode, the seal retry profile, and the RPC deadline.

use super::seal_extent_on_store;
use crate::context::Context;
use crate::directory::ServiceKind;
use crate::error::{ControllerError, Result};
use crate::metadata::{ExtentStatus, MetadataError};
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SealState {
    CheckPrecondition,
    SealExtent,
    UpdateMetadata,
    Done,
}

/// An extent became unreachable and must be sealed
pub struct ExtentDownEvent {
    state: SealState,
    seal_seq: i64,
    destination_id: String,
    extent_id: String,
    store_ids: Vec<String>,
}

impl ExtentDownEvent {
    pub fn new(
        seal_seq: i64,
        destination_id: impl Into<String>,
        extent_id: impl Into<String>,
    ) -> Self {
        Self {
            state: SealState::CheckPrecondition,
            seal_seq,
            destination_id: destination_id.into(),
            extent_id: extent_id.into(),
            store_ids: Vec::new(),
        }
    }
}

#[async_trait]
impl Event for ExtentDownEvent {
    fn scope(&self) -> EventScope {
        EventScope::ExtentDown
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let is_retry = self.state != SealState::CheckPrecondition;

        loop {
            match self.state {
                SealState::CheckPrecondition => {
                    let stats = match ctx
                        .metadata
                        .read_extent_stats(&self.destination_id, &self.extent_id)
                        .await
                    {
                        Ok(stats) => stats,
                        Err(err) => {
                            ControllerMetrics::increment_metadata_read_errors(self.scope());
                            error!(
                                destination_id = %self.destination_id,
                                extent_id = %self.extent_id,
                                error = %err,
                                "cannot read extent stats"
                            );
                            return Err(ControllerError::MetadataRead(err));
                        }
                    };

                    if stats.status != ExtentStatus::Open {
                        // Another actor already advanced the extent
                        warn!(
                            destination_id = %self.destination_id,
                            extent_id = %self.extent_id,
                            status = ?stats.status,
                            "extent is not OPEN, dropping seal event"
                        );
                        return Ok(());
                    }

                    self.store_ids = stats.extent.store_ids;
                    self.state = SealState::SealExtent;
                }

                SealState::SealExtent => {
                    let mut stores: Vec<(String, String)> =
                        Vec::with_capacity(self.store_ids.len());
                    for store_id in &self.store_ids {
                        match ctx
                            .directory
                            .resolve_uuid(ServiceKind::StoreHost, store_id)
                            .await
                        {
                            Ok(addr) => stores.push((store_id.clone(), addr)),
                            Err(_) => continue, // unhealthy store, skip
                        }
                    }

                    if stores.is_empty() {
                        ControllerMetrics::increment_no_healthy_store();
                        ControllerMetrics::increment_seal_failures();
                        error!(
                            destination_id = %self.destination_id,
                            extent_id = %self.extent_id,
                            "cannot seal extent, none of the store hosts are healthy"
                        );
                        return Err(ControllerError::NoHealthyStore(self.extent_id.clone()));
                    }

                    // First attempts probe the bucket and fall back to the
                    // retry executor; retry re-entries can afford to wait
                    let admitted = if is_retry {
                        ctx.seals
                            .token_bucket
                            .consume(1, ctx.config.seal_rate_limit_max_wait)
                            .await
                    } else {
                        ctx.seals.token_bucket.try_consume(1)
                    };
                    if !admitted {
                        ControllerMetrics::increment_seal_rate_limited();
                        return Err(ControllerError::SealRateLimited);
                    }

                    let mut tasks: JoinSet<bool> = JoinSet::new();
                    for (store_id, addr) in stores {
                        let ctx = Arc::clone(ctx);
                        let extent_id = self.extent_id.clone();
                        let seal_seq = self.seal_seq;
                        tasks.spawn(async move {
                            let sealed = seal_extent_on_store(
                                &ctx, &store_id, &addr, &extent_id, seal_seq, is_retry,
                            )
                            .await
                            .is_ok();
                            if sealed {
                                ctx.monitor.invalidate_store_extent_cache(&store_id, &extent_id);
                            }
                            sealed
                        });
                    }

                    // Unconditional join: invalidation must never trail a
                    // returned handler
                    let mut successes = 0u32;
                    while let Some(joined) = tasks.join_next().await {
                        if matches!(joined, Ok(true)) {
                            successes += 1;
                        }
                    }

                    if successes < 1 {
                        ControllerMetrics::increment_seal_failures();
                        error!(
                            destination_id = %self.destination_id,
                            extent_id = %self.extent_id,
                            "sealing extent failed on every store"
                        );
                        return Err(ControllerError::SealFailed(self.extent_id.clone()));
                    }

                    info!(
                        destination_id = %self.destination_id,
                        extent_id = %self.extent_id,
                        "extent sealed on stores"
                    );
                    self.state = SealState::UpdateMetadata;
                }

                SealState::UpdateMetadata => {
                    match ctx
                        .metadata
                        .seal_extent(&self.destination_id, &self.extent_id)
                        .await
                    {
                        Ok(()) => {}
                        Err(MetadataError::IllegalState) => {
                            // Concurrent controller or weakly consistent
                            // metadata already moved the record past OPEN
                            warn!(
                                destination_id = %self.destination_id,
                                extent_id = %self.extent_id,
                                "extent state already advanced in metadata, moving on"
                            );
                        }
                        Err(err) => {
                            ControllerMetrics::increment_metadata_update_errors(self.scope());
                            error!(
                                destination_id = %self.destination_id,
                                extent_id = %self.extent_id,
                                error = %err,
                                "extent sealed on stores but metadata update failed"
                            );
                            return Err(ControllerError::MetadataUpdate(err));
                        }
                    }

                    ctx.seals.failed.remove(&self.extent_id);
                    self.state = SealState::Done;
                }

                SealState::Done => return Ok(()),
            }
        }
    }

    async fn done(&mut self, ctx: &Arc<Context>, result: &Result<()>) {
        if result.is_err() {
            // Terminal failure: remember the extent so GetInputHosts answers
            // exclude it until the next successful reconciliation
            ctx.seals.record_failed(&self.extent_id);
            ControllerMetrics::set_failed_seal_set_size(ctx.seals.failed.len());
        }
        // In-progress removal comes last on every exit path; once the slot
        // is free the extent may be handed out for writes again
        ctx.seals.in_progress.remove(&self.extent_id);
        ControllerMetrics::set_in_progress_seal_count(ctx.seals.in_progress.len());
    }
}
