//! Process-global pacing for outbound EDS calls.
//!
//! All four EDS operations share one token bucket so parallel ingestion
//! workers cannot exceed the API quota together. The lock is only held to
//! compute the wait; sleeping happens outside it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::time::sleep;

/// Token bucket refilled continuously at `rate_per_sec`, with burst capacity
/// equal to one second of refill.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    rate_per_sec: f64,
    capacity: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(rate_per_sec: u32) -> Self {
        let rate = f64::from(rate_per_sec.max(1));
        Self {
            state: Mutex::new(BucketState {
                tokens: rate,
                last_refill: Instant::now(),
            }),
            rate_per_sec: rate,
            capacity: rate,
        }
    }

    /// Take one token, sleeping until the bucket refills if necessary.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64(
                        (1.0 - state.tokens) / self.rate_per_sec,
                    ))
                }
            };

            match wait {
                None => return,
                Some(d) => sleep(d).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_within_capacity_does_not_sleep() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn exceeding_capacity_paces_calls() {
        let limiter = RateLimiter::new(100);
        let start = Instant::now();
        // 120 calls at 100/s: the 20 over capacity must wait ~200ms total.
        for _ in 0..120 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
