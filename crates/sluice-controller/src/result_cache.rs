//! Output-host result cache seam and the refresh trigger
//!
//! `GetOutputHosts`-style lookups are served from a result cache keyed by
//! consumer group. After a consumer-visible change (new extent bound, extent
//! repaired) the cache must converge quickly: the trigger rewrites the
//! entry's expiry to "now" so the next reader refreshes, unless the entry
//! was already about to refresh on its own.

use crate::metadata::DestinationType;
use std::time::{SystemTime, UNIX_EPOCH};

/// One cached `GetOutputHosts` answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCacheEntry {
    pub destination_type: DestinationType,
    pub extent_count: usize,
    pub host_ids: Vec<String>,
    /// Unix nanos after which the next reader refreshes the entry
    pub expiry_nanos: i64,
}

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub hit: bool,
    /// The entry is already marked for refresh by an earlier reader
    pub refresh_scheduled: bool,
    pub entry: Option<ResultCacheEntry>,
}

impl CacheLookup {
    pub fn miss() -> Self {
        Self {
            hit: false,
            refresh_scheduled: false,
            entry: None,
        }
    }
}

/// Single-writer, multi-reader result cache
///
/// The refresh trigger uses last-write-wins on the expiry field.
pub trait ResultCache: Send + Sync {
    fn read_output_hosts(&self, consumer_group_id: &str, now_nanos: i64) -> CacheLookup;
    fn write(&self, consumer_group_id: &str, entry: ResultCacheEntry);
}

/// Current wall-clock time as unix nanos
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_nanos_is_monotonic_enough() {
        let a = now_nanos();
        let b = now_nanos();
        assert!(b >= a);
        assert!(a > 0);
    }
}
