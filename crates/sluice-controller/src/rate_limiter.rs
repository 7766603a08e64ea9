//! Token-bucket admission control for seal RPCs
//!
//! Extent seals fan out to every replica of an extent, so an input-host
//! failure can turn into a thundering herd against the store fleet. All seal
//! attempts pass through one process-wide bucket: first attempts probe with
//! [`TokenBucket::try_consume`] and fall back to the retry executor,
//! retry-worker attempts block on [`TokenBucket::consume`] with a bounded
//! wait.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Thread-safe token bucket
///
/// A refill rate of zero disables limiting (every acquisition succeeds).
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_sec: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket holding at most `capacity` tokens, refilled at
    /// `refill_per_sec` tokens per second
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec as f64,
        }
    }

    /// Take `n` tokens without blocking; false when the bucket is short
    pub fn try_consume(&self, n: u32) -> bool {
        if self.refill_per_sec == 0.0 {
            return true;
        }
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= n as f64 {
            state.tokens -= n as f64;
            true
        } else {
            false
        }
    }

    /// Take `n` tokens, waiting up to `max_wait` for the bucket to refill
    pub async fn consume(&self, n: u32, max_wait: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        loop {
            if self.try_consume(n) {
                return true;
            }
            let wait = self.time_until_available(n).max(Duration::from_millis(5));
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if now + wait >= deadline {
                sleep(deadline - now).await;
                return self.try_consume(n);
            }
            sleep(wait).await;
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed();
        state.tokens =
            (state.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        state.last_refill = Instant::now();
    }

    fn time_until_available(&self, n: u32) -> Duration {
        let state = self.state.lock();
        let deficit = n as f64 - state.tokens;
        if deficit <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(deficit / self.refill_per_sec)
    }
}
