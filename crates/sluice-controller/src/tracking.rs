//! Shared seal-tracking state
//!
//! Two concurrent sets keyed by extent ID serialize seal work across the
//! pipeline:
//!
//! - **in-progress**: one entry per extent with an active seal attempt.
//!   Inserted when the `ExtentDownEvent` is enqueued, removed in its `done`
//!   cleanup. `GetInputHosts`-style callers filter against this set so an
//!   extent about to seal is never handed out for writes.
//! - **failed**: extents whose most recent seal attempt exhausted retries.
//!   Bounded; entries are cleared by the next successful seal.

use crate::rate_limiter::TokenBucket;
use dashmap::DashMap;
use tracing::warn;

/// Unbounded concurrent set of extent IDs
pub struct InProgressSet {
    inner: DashMap<String, ()>,
}

impl InProgressSet {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Insert; false if the extent was already tracked
    pub fn insert(&self, extent_id: &str) -> bool {
        self.inner.insert(extent_id.to_owned(), ()).is_none()
    }

    pub fn remove(&self, extent_id: &str) {
        self.inner.remove(extent_id);
    }

    pub fn contains(&self, extent_id: &str) -> bool {
        self.inner.contains_key(extent_id)
    }

    /// Approximate size
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for InProgressSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded concurrent set of extent IDs
pub struct FailedSet {
    inner: DashMap<String, ()>,
    capacity: usize,
}

impl FailedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: DashMap::new(),
            capacity,
        }
    }

    /// Insert unless the set is at capacity; false when dropped
    pub fn try_insert(&self, extent_id: &str) -> bool {
        if self.inner.len() >= self.capacity {
            return false;
        }
        self.inner.insert(extent_id.to_owned(), ());
        true
    }

    pub fn remove(&self, extent_id: &str) {
        self.inner.remove(extent_id);
    }

    pub fn contains(&self, extent_id: &str) -> bool {
        self.inner.contains_key(extent_id)
    }

    /// Approximate size
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Process-wide seal coordination: tracking sets plus the admission bucket
pub struct ExtentSeals {
    pub in_progress: InProgressSet,
    pub failed: FailedSet,
    pub token_bucket: TokenBucket,
}

impl ExtentSeals {
    pub fn new(failed_capacity: usize, seal_token_burst: u32, seal_tokens_per_second: u32) -> Self {
        Self {
            in_progress: InProgressSet::new(),
            failed: FailedSet::new(failed_capacity),
            token_bucket: TokenBucket::new(seal_token_burst, seal_tokens_per_second),
        }
    }

    /// Record a terminal seal failure, best effort under the capacity bound
    pub fn record_failed(&self, extent_id: &str) {
        if !self.failed.try_insert(extent_id) {
            warn!(
                extent_id = %extent_id,
                "failed-seal set at capacity, dropping entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_single_entry_per_extent() {
        let set = InProgressSet::new();
        assert!(set.insert("e1"));
        assert!(!set.insert("e1"));
        assert!(set.contains("e1"));
        set.remove("e1");
        assert!(!set.contains("e1"));
        assert!(set.insert("e1"));
    }

    #[test]
    fn test_failed_set_respects_capacity() {
        let set = FailedSet::new(2);
        assert!(set.try_insert("e1"));
        assert!(set.try_insert("e2"));
        assert!(!set.try_insert("e3"));
        assert_eq!(set.len(), 2);
        set.remove("e1");
        assert!(set.try_insert("e3"));
    }

    #[test]
    fn test_failed_set_reinsert_at_capacity_of_existing_key() {
        let set = FailedSet::new(1);
        assert!(set.try_insert("e1"));
        // Already at capacity, even for a key that is present
        assert!(!set.try_insert("e1"));
        assert!(set.contains("e1"));
    }
}
