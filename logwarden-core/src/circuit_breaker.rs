use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use logwarden_model::CircuitState;

/// Closed/half-open/open state machine gating whether a sink worker should
/// even attempt a send (spec §4.2). Only failures the caller marks as
/// "counts as circuit fault" move the needle — classification happens
/// upstream (see `logwarden_contracts::ErrorClass`) so a stream of
/// permanently-rejected entries never trips the breaker for an otherwise
/// healthy backend.
pub struct CircuitBreaker {
    failure_threshold: u32,
    open_timeout: Duration,
    half_open_successes_to_close: u32,
    half_open_max_probes: u32,

    state: AtomicU8,
    consecutive_failures: AtomicU32,
    half_open_successes: AtomicU32,
    half_open_probes_in_flight: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    trips: AtomicU64,
}

/// Tunables for one sink's breaker. Sinks that expose their own
/// `CircuitBreakerConfig` (the ordered log store does) get theirs passed
/// through by the agent's wiring; anything else falls back to `Default`.
#[derive(Clone, Copy, Debug)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub half_open_successes_to_close: u32,
    pub half_open_max_probes: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 15,
            open_timeout: Duration::from_secs(60),
            half_open_successes_to_close: 3,
            half_open_max_probes: 2,
        }
    }
}

impl CircuitBreaker {
    pub fn from_settings(settings: BreakerSettings) -> Self {
        Self::new(
            settings.failure_threshold,
            settings.open_timeout,
            settings.half_open_successes_to_close,
            settings.half_open_max_probes,
        )
    }

    pub fn new(
        failure_threshold: u32,
        open_timeout: Duration,
        half_open_successes_to_close: u32,
        half_open_max_probes: u32,
    ) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            open_timeout,
            half_open_successes_to_close: half_open_successes_to_close.max(1),
            half_open_max_probes: half_open_max_probes.max(1),
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
            half_open_probes_in_flight: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            trips: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CircuitState {
        state_from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn trip_count(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }

    /// Whether a caller may attempt a send right now. Transitions Open to
    /// HalfOpen once the cooldown elapses and admits a bounded number of
    /// probes; anything beyond that count is refused until one resolves.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.half_open_max_probes).then_some(n + 1)
                    })
                    .is_ok()
            }
            CircuitState::Open => {
                let elapsed = self
                    .opened_at
                    .lock()
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.open_timeout {
                    self.transition_to_half_open();
                    self.allow_request()
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight.fetch_sub(1, Ordering::AcqRel);
                let successes = self.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.half_open_successes_to_close {
                    self.transition_to_closed();
                }
            }
            CircuitState::Open => {}
        }
    }

    /// `counts_as_fault` should come from `ErrorKind::counts_as_circuit_fault`
    /// — permanent/data errors must not be passed here as faults.
    pub fn record_failure(&self, counts_as_fault: bool) {
        if !counts_as_fault {
            return;
        }

        match self.state() {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.failure_threshold {
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight.fetch_sub(1, Ordering::AcqRel);
                self.transition_to_open();
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);
        *self.opened_at.lock() = Some(Instant::now());
        self.trips.fetch_add(1, Ordering::Relaxed);
    }

    fn transition_to_half_open(&self) {
        let prev = self.state.swap(CircuitState::HalfOpen as u8, Ordering::AcqRel);
        if prev != CircuitState::HalfOpen as u8 {
            self.half_open_successes.store(0, Ordering::Relaxed);
            self.half_open_probes_in_flight.store(0, Ordering::Relaxed);
        }
    }

    fn transition_to_closed(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.half_open_successes.store(0, Ordering::Relaxed);
        self.half_open_probes_in_flight.store(0, Ordering::Relaxed);
        *self.opened_at.lock() = None;
    }
}

fn state_from_u8(v: u8) -> CircuitState {
    match v {
        0 => CircuitState::Closed,
        1 => CircuitState::HalfOpen,
        _ => CircuitState::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_millis(20), 2, 2)
    }

    #[test]
    fn opens_after_threshold_faults() {
        let cb = breaker();
        cb.record_failure(true);
        cb.record_failure(true);
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure(true);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn non_fault_errors_never_trip_it() {
        let cb = breaker();
        for _ in 0..100 {
            cb.record_failure(false);
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_closes_after_enough_successes() {
        let cb = breaker();
        cb.record_failure(true);
        cb.record_failure(true);
        cb.record_failure(true);
        assert_eq!(cb.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(25));
        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let cb = breaker();
        cb.record_failure(true);
        cb.record_failure(true);
        cb.record_failure(true);
        std::thread::sleep(Duration::from_millis(25));
        assert!(cb.allow_request());

        cb.record_failure(true);
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
