use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use logwarden_model::ErrorKind;

/// Tracks how far back (and how far forward) a timestamp may be before a
/// backend rejects it, and narrows that window when the backend actually
/// rejects something (spec §4.5). The window only ever shrinks: a backend
/// that loosens its own limits doesn't need us to notice, but one that
/// tightens them does, or every subsequent batch bounces too.
pub struct TimestampLearner {
    configured_max_age: Duration,
    future_tolerance: Duration,
    learned_max_age_secs: AtomicI64,
    min_learning_window: Duration,
}

pub enum TimestampVerdict {
    Ok,
    TooOld,
    TooNew,
    Zero,
}

impl TimestampLearner {
    pub fn new(configured_max_age: Duration, future_tolerance: Duration, min_learning_window: Duration) -> Self {
        Self {
            configured_max_age,
            future_tolerance,
            learned_max_age_secs: AtomicI64::new(configured_max_age.as_secs() as i64),
            min_learning_window,
        }
    }

    fn effective_max_age(&self) -> Duration {
        Duration::from_secs(self.learned_max_age_secs.load(Ordering::Relaxed).max(0) as u64)
    }

    pub fn validate(&self, timestamp: DateTime<Utc>) -> TimestampVerdict {
        if timestamp.timestamp() == 0 {
            return TimestampVerdict::Zero;
        }

        let now = Utc::now();
        let age = now.signed_duration_since(timestamp);

        if age.num_seconds() < 0 {
            let future_by = -age.num_seconds();
            if future_by as u64 > self.future_tolerance.as_secs() {
                return TimestampVerdict::TooNew;
            }
            return TimestampVerdict::Ok;
        }

        if age.to_std().unwrap_or(Duration::ZERO) > self.effective_max_age() {
            return TimestampVerdict::TooOld;
        }

        TimestampVerdict::Ok
    }

    /// Pulls an out-of-window timestamp back to the nearest edge of the
    /// currently learned window, so entries with merely stale clocks can
    /// still be delivered instead of dropped outright.
    pub fn clamp(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let now = Utc::now();
        let oldest_allowed = now - chrono::Duration::from_std(self.effective_max_age()).unwrap_or_default();
        let newest_allowed = now + chrono::Duration::from_std(self.future_tolerance).unwrap_or_default();

        if timestamp < oldest_allowed {
            oldest_allowed
        } else if timestamp > newest_allowed {
            newest_allowed
        } else {
            timestamp
        }
    }

    /// Called when a sink reports the backend rejected a batch for a
    /// timestamp-related reason. Shrinks the learned window to just inside
    /// the age that was actually rejected, never below `min_learning_window`.
    pub fn learn_from_rejection(&self, rejected_timestamp: DateTime<Utc>, kind: ErrorKind) {
        if !matches!(kind, ErrorKind::TimestampTooOld) {
            return;
        }

        let now = Utc::now();
        let rejected_age = now.signed_duration_since(rejected_timestamp);
        let Ok(rejected_age) = rejected_age.to_std() else {
            return;
        };

        let new_max = rejected_age
            .checked_sub(Duration::from_secs(1))
            .unwrap_or(Duration::ZERO)
            .max(self.min_learning_window);

        self.learned_max_age_secs
            .fetch_min(new_max.as_secs() as i64, Ordering::Relaxed);
    }

    pub fn current_window(&self) -> Duration {
        self.effective_max_age()
    }

    pub fn configured_window(&self) -> Duration {
        self.configured_max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_recent_timestamp() {
        let learner = TimestampLearner::new(Duration::from_secs(86400), Duration::from_secs(60), Duration::from_secs(300));
        assert!(matches!(learner.validate(Utc::now()), TimestampVerdict::Ok));
    }

    #[test]
    fn rejects_timestamp_beyond_window() {
        let learner = TimestampLearner::new(Duration::from_secs(60), Duration::from_secs(60), Duration::from_secs(10));
        let old = Utc::now() - chrono::Duration::seconds(3600);
        assert!(matches!(learner.validate(old), TimestampVerdict::TooOld));
    }

    #[test]
    fn zero_timestamp_is_flagged() {
        let learner = TimestampLearner::new(Duration::from_secs(86400), Duration::from_secs(60), Duration::from_secs(300));
        let zero = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert!(matches!(learner.validate(zero), TimestampVerdict::Zero));
    }

    #[test]
    fn window_shrinks_but_never_grows() {
        let learner = TimestampLearner::new(Duration::from_secs(86400), Duration::from_secs(60), Duration::from_secs(300));
        let rejected_at = Utc::now() - chrono::Duration::seconds(3600);

        learner.learn_from_rejection(rejected_at, ErrorKind::TimestampTooOld);
        let shrunk = learner.current_window();
        assert!(shrunk < Duration::from_secs(86400));

        // A later "rejection" further in the past must not widen the window.
        let even_older = Utc::now() - chrono::Duration::seconds(7200);
        learner.learn_from_rejection(even_older, ErrorKind::TimestampTooOld);
        assert!(learner.current_window() <= shrunk);
    }

    #[test]
    fn window_never_shrinks_below_minimum() {
        let learner = TimestampLearner::new(Duration::from_secs(86400), Duration::from_secs(60), Duration::from_secs(300));
        let almost_now = Utc::now() - chrono::Duration::seconds(1);
        learner.learn_from_rejection(almost_now, ErrorKind::TimestampTooOld);
        assert!(learner.current_window() >= Duration::from_secs(300));
    }
}
