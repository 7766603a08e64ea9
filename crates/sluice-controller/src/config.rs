//! Controller configuration

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Availability zone this controller runs in. Extents originating in a
    /// different zone are replicated, not sealed, by host-failure handling.
    pub local_zone: String,

    /// Bounded capacity of the event queue
    pub event_queue_capacity: usize,

    /// Number of worker tasks draining the event queue
    pub worker_count: usize,

    /// Seal admission rate (token-bucket refill, tokens/second).
    /// Zero disables rate limiting.
    pub seal_tokens_per_second: u32,

    /// Seal admission burst (token-bucket capacity)
    pub seal_token_burst: u32,

    /// Longest a retry-worker seal attempt waits for a rate-limiter token
    pub seal_rate_limit_max_wait: Duration,

    /// Upper bound on the failed-seal tracking set
    pub max_failed_extent_seal_set_size: usize,

    /// Longest an output-host result-cache entry may stay stale after a
    /// consumer-visible change
    pub result_cache_refresh_max_wait: Duration,

    /// Retry profiles
    pub retry: RetryProfiles,

    /// Per-RPC deadlines
    pub rpc: RpcDeadlines,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            local_zone: String::new(),
            event_queue_capacity: 4096,
            worker_count: 8,
            seal_tokens_per_second: 100,
            seal_token_burst: 100,
            seal_rate_limit_max_wait: Duration::from_secs(10),
            max_failed_extent_seal_set_size: 16 * 1024,
            result_cache_refresh_max_wait: Duration::from_millis(500),
            retry: RetryProfiles::default(),
            rpc: RpcDeadlines::default(),
        }
    }
}

/// Named exponential-backoff profiles
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryProfiles {
    /// Host notification RPCs
    pub notification: RetryPolicy,
    /// First seal attempt per extent (short, fail over to the retry path)
    pub seal_initial: RetryPolicy,
    /// Seal attempts re-entering via the retry executor
    pub seal_retry: RetryPolicy,
    /// Pipeline retry executor: re-submission of events that failed retryably
    pub pipeline: RetryPolicy,
}

impl Default for RetryProfiles {
    fn default() -> Self {
        Self {
            notification: RetryPolicy::new(
                Duration::from_millis(500),
                Duration::from_secs(10),
                Duration::from_secs(60),
                3,
            ),
            seal_initial: RetryPolicy::new(
                Duration::from_millis(500),
                Duration::from_secs(10),
                Duration::from_secs(60),
                2,
            ),
            seal_retry: RetryPolicy::new(
                Duration::from_secs(3),
                Duration::from_secs(30),
                Duration::from_secs(60),
                3,
            ),
            pipeline: RetryPolicy::new(
                Duration::from_secs(1),
                Duration::from_secs(60),
                Duration::from_secs(600),
                8,
            ),
        }
    }
}

/// Per-RPC deadlines
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RpcDeadlines {
    /// Seal on the worker's first attempt per extent
    pub seal_initial: Duration,
    /// Seal via the retry executor
    pub seal_retry: Duration,
    /// Replication kickoff calls
    pub replicate: Duration,
    /// Input/output host notifications
    pub notification: Duration,
}

impl Default for RpcDeadlines {
    fn default() -> Self {
        Self {
            seal_initial: Duration::from_secs(2),
            seal_retry: Duration::from_secs(20),
            replicate: Duration::from_secs(20),
            notification: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles_match_operational_values() {
        let config = ControllerConfig::default();
        assert_eq!(config.retry.notification.max_attempts, 3);
        assert_eq!(config.retry.seal_initial.max_attempts, 2);
        assert_eq!(
            config.retry.seal_retry.initial_interval,
            Duration::from_secs(3)
        );
        assert_eq!(config.rpc.seal_initial, Duration::from_secs(2));
        assert_eq!(config.rpc.seal_retry, Duration::from_secs(20));
        assert_eq!(config.result_cache_refresh_max_wait, Duration::from_millis(500));
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = ControllerConfig {
            local_zone: "zone-a".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ControllerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.local_zone, "zone-a");
        assert_eq!(parsed.worker_count, config.worker_count);
    }
}
