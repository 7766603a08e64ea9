//! Exponential backoff and retry execution

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Exponential-backoff descriptor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Upper bound on any single delay
    pub max_interval: Duration,
    /// Give up once this much wall-clock time has elapsed
    pub expiry: Duration,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        expiry: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_interval,
            max_interval,
            expiry,
            max_attempts,
        }
    }

    /// Delay before retry number `attempt` (zero-based), with ±25% jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_interval.as_millis() as f64
            * BACKOFF_MULTIPLIER.powi(attempt.min(63) as i32);
        let capped = base.min(self.max_interval.as_millis() as f64);
        let jitter = (rand::random::<f64>() * 0.5 - 0.25) * capped;
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

/// Run `op` until it succeeds, returns a non-retryable error, or the policy
/// is exhausted (attempts or expiry)
pub async fn retry_with_policy<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_retryable: P,
    mut op: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = policy.backoff(attempt - 1);
                if started.elapsed() + delay > policy.expiry {
                    return Err(err);
                }
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(4),
            Duration::from_secs(5),
            max_attempts,
        )
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            Duration::from_secs(60),
            5,
        );
        // ±25% jitter around 100ms / 200ms
        let first = policy.backoff(0);
        assert!(first >= Duration::from_millis(75) && first <= Duration::from_millis(125));
        let second = policy.backoff(1);
        assert!(second >= Duration::from_millis(150) && second <= Duration::from_millis(250));
        // Far past the cap
        let late = policy.backoff(30);
        assert!(late <= Duration::from_millis(1250));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_policy(
            fast_policy(5),
            |_| true,
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient")
                } else {
                    Ok(7)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_policy(
            fast_policy(5),
            |e: &&str| *e != "fatal",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            },
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_respects_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_policy(
            fast_policy(3),
            |_| true,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("transient")
            },
        )
        .await;
        assert_eq!(result, Err("transient"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
