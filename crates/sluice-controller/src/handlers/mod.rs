//! Event handlers
//!
//! One module per event kind plus the helpers they share. Handlers react to
//! extent lifecycle changes by driving seals, fanning out reconfiguration
//! notices to data-plane hosts, and keeping the output-host result cache
//! coherent.

mod cons_group_updated;
mod extent_created;
mod extent_down;
mod host_failed;
mod notifications;
mod out_of_sync;
mod remote_zone;

pub use cons_group_updated::ConsGroupUpdatedEvent;
pub use extent_created::ExtentCreatedEvent;
pub use extent_down::ExtentDownEvent;
pub use host_failed::{InputHostFailedEvent, StoreHostFailedEvent};
pub use notifications::{InputHostNotificationEvent, OutputHostNotificationEvent};
pub use out_of_sync::StoreExtentStatusOutOfSyncEvent;
pub use remote_zone::RemoteZoneExtentCreatedEvent;

use crate::clients::{with_deadline, RpcError, StoreClientLease};
use crate::context::Context;
use crate::error::Result;
use crate::metadata::{ConsumerGroupExtentStatus, ConsumerGroupStatus, ExtentStats};
use crate::observability::{ControllerMetrics, EventScope};
use crate::result_cache::{now_nanos, ResultCacheEntry};
use crate::retry::retry_with_policy;
use sluice_protocol::{NotificationType, SealExtentRequest};
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Reasons attached to host notifications
pub mod reasons {
    pub const EXTENT_CREATED: &str = "ExtentCreated";
    pub const EXTENT_REPAIRED: &str = "ExtentRepaired";
    pub const CG_EXT_UPDATED: &str = "CGExtUpdated";
    pub const DLQ_MERGED_EXTENTS: &str = "DLQMergedExtents";
    pub const CG_DELETED: &str = "CGDeleted";
}

/// Seal one extent on one store under the attempt-appropriate retry policy
/// and RPC deadline
///
/// First attempts use the short profile and fail over to the retry executor;
/// retry-worker attempts can afford the longer one.
pub(crate) async fn seal_extent_on_store(
    ctx: &Context,
    store_id: &str,
    store_addr: &str,
    extent_id: &str,
    seal_seq: i64,
    is_retry: bool,
) -> Result<()> {
    let lease = match StoreClientLease::acquire(&ctx.clients, store_addr, store_id) {
        Ok(lease) => lease,
        Err(err) => {
            error!(
                store_id = %store_id,
                error = %err,
                "client factory failed to vend store client"
            );
            return Err(err.into());
        }
    };

    let (deadline, policy) = if is_retry {
        (ctx.config.rpc.seal_retry, ctx.config.retry.seal_retry)
    } else {
        (ctx.config.rpc.seal_initial, ctx.config.retry.seal_initial)
    };

    let client = lease.client();
    let req = SealExtentRequest::new(extent_id, seal_seq);
    let result = retry_with_policy(
        policy,
        |err: &RpcError| err.is_retryable(),
        || {
            let req = req.clone();
            async move {
                let attempt = with_deadline(deadline, client.seal_extent(req)).await;
                if let Err(err) = &attempt {
                    error!(
                        extent_id = %extent_id,
                        store_id = %store_id,
                        store_addr = %store_addr,
                        error = %err,
                        "seal attempt on store failed"
                    );
                }
                attempt
            }
        },
    )
    .await;

    if let Err(err) = &result {
        error!(
            extent_id = %extent_id,
            store_id = %store_id,
            store_addr = %store_addr,
            error = %err,
            "sealing extent failed on store, retries exceeded"
        );
    }
    result.map_err(Into::into)
}

/// Notify every output host serving `destination_id` so consumers reconnect
/// and pick up the new extent, then force the result cache for each enabled
/// consumer group to refresh
pub(crate) async fn reconfigure_all_consumers(
    ctx: &Context,
    destination_id: &str,
    extent_id: &str,
    reason: &str,
    reason_context: &str,
    scope: EventScope,
) {
    let consumer_groups = match ctx.metadata.list_consumer_groups_by_dst(destination_id).await {
        Ok(groups) => groups,
        Err(err) => {
            ControllerMetrics::increment_metadata_read_errors(scope);
            error!(
                destination_id = %destination_id,
                error = %err,
                "listing consumer groups failed, cannot notify output hosts about new extent"
            );
            Vec::new()
        }
    };

    for cg in consumer_groups {
        if cg.status != ConsumerGroupStatus::Enabled {
            continue;
        }

        let extents = match ctx
            .metadata
            .list_extents_by_consumer_group(
                destination_id,
                &cg.consumer_group_id,
                &[ConsumerGroupExtentStatus::Open],
            )
            .await
        {
            Ok(extents) => extents,
            Err(_) => continue,
        };

        let output_hosts: HashSet<String> =
            extents.into_iter().map(|e| e.output_host_id).collect();

        for host_id in output_hosts {
            let notify = OutputHostNotificationEvent::new(
                destination_id,
                &cg.consumer_group_id,
                &host_id,
                reason,
                reason_context,
                NotificationType::Client,
            );
            if !ctx.queue.add(Box::new(notify)) {
                error!(
                    destination_id = %destination_id,
                    consumer_group_id = %cg.consumer_group_id,
                    extent_id = %extent_id,
                    output_host_id = %host_id,
                    reason = %reason,
                    "failed to enqueue output-host notification, event queue full"
                );
            }
        }

        trigger_cache_refresh_for_cg(ctx, &cg.consumer_group_id);
    }
}

/// Force the output-host result cache for `consumer_group_id` to refresh on
/// its next read, unless it is already about to
pub(crate) fn trigger_cache_refresh_for_cg(ctx: &Context, consumer_group_id: &str) {
    let now = now_nanos();
    let lookup = ctx.result_cache.read_output_hosts(consumer_group_id, now);
    if !lookup.hit || lookup.refresh_scheduled {
        return;
    }
    let Some(entry) = lookup.entry else {
        return;
    };

    let deadline = now + ctx.config.result_cache_refresh_max_wait.as_nanos() as i64;
    if entry.expiry_nanos < deadline {
        return; // refreshing soon anyway
    }

    ctx.result_cache.write(
        consumer_group_id,
        ResultCacheEntry {
            expiry_nanos: now,
            ..entry
        },
    );
}

/// Enqueue an `ExtentDownEvent` per local-zone extent in `stats`
///
/// Remote-zone extents are replicated into this zone, never sealed by it.
pub(crate) fn create_extent_down_events(ctx: &Context, stats: &[ExtentStats]) {
    for stat in stats {
        if stat.extent.is_in_remote_zone(&ctx.config.local_zone) {
            continue;
        }
        add_extent_down_event(ctx, 0, &stat.extent.destination_id, &stat.extent.extent_id);
    }
}

/// Offer an `ExtentDownEvent` for one extent, deduplicating against seals
/// already in flight
///
/// The extent enters the in-progress set before the enqueue so concurrent
/// triggers cannot race two seals for the same extent; a full queue rolls
/// the insert back.
pub fn add_extent_down_event(
    ctx: &Context,
    seal_seq: i64,
    destination_id: &str,
    extent_id: &str,
) {
    if !ctx.seals.in_progress.insert(extent_id) {
        debug!(extent_id = %extent_id, "seal already in progress, skipping");
        return;
    }
    ControllerMetrics::set_in_progress_seal_count(ctx.seals.in_progress.len());

    let event = ExtentDownEvent::new(seal_seq, destination_id, extent_id);
    if !ctx.queue.add(Box::new(event)) {
        ctx.seals.in_progress.remove(extent_id);
        warn!(
            destination_id = %destination_id,
            extent_id = %extent_id,
            "event queue full, dropping extent seal request"
        );
    }
}
