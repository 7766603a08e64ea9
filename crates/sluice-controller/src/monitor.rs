//! Extent-monitor seam
//!
//! The background extent monitor keeps a per-store cache of extent states it
//! has observed; after a seal touches a store, the corresponding entry must
//! be invalidated so the monitor re-reads the store instead of re-raising
//! stale out-of-sync events.

/// Store-extent cache owned by the background extent monitor
pub trait ExtentStateMonitor: Send + Sync {
    /// Drop the monitor's cached state for `(store_id, extent_id)`
    fn invalidate_store_extent_cache(&self, store_id: &str, extent_id: &str);
}
