use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Token-bucket limiter gating how many entries `Handle` admits per second
/// (spec §4.6). Refill is computed lazily from elapsed wall-clock time on
/// each `try_acquire` rather than via a background ticker, so an idle
/// dispatcher costs nothing.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
    rejected: AtomicU64,
}

struct BucketState {
    tokens: f64,
    last_refill: std::time::Instant,
}

impl RateLimiter {
    /// `rate_per_sec` of 0 disables limiting: `try_acquire` always succeeds.
    pub fn new(rate_per_sec: u64, burst: u64) -> Self {
        let capacity = burst.max(rate_per_sec).max(1) as f64;
        Self {
            capacity,
            refill_per_sec: rate_per_sec as f64,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: std::time::Instant::now(),
            }),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.refill_per_sec > 0.0
    }

    /// Attempts to take one token. Returns `true` if admitted.
    pub fn try_acquire(&self) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut state = self.state.lock();
        let now = std::time::Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Narrows the effective rate under sustained backpressure without
    /// touching configured capacity; `factor` in `[0.0, 1.0]`.
    pub fn throttled_rate(&self, factor: f64) -> f64 {
        self.refill_per_sec * factor.clamp(0.0, 1.0)
    }

    pub fn time_until_next_token(&self) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        let state = self.state.lock();
        if state.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_limiter_always_admits() {
        let limiter = RateLimiter::disabled();
        for _ in 0..10_000 {
            assert!(limiter.try_acquire());
        }
    }

    #[test]
    fn exhausts_burst_then_rejects() {
        let limiter = RateLimiter::new(1, 5);
        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.rejected_count(), 1);
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimiter::new(1000, 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.try_acquire());
    }
}
