use std::sync::atomic::{AtomicU8, Ordering};

use logwarden_config::DispatcherConfig;

/// Discrete backpressure levels (spec §4.4), ordered so `>=` comparisons
/// work for "at least this severe" checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum BackpressureLevel {
    Normal = 0,
    Warning = 1,
    Critical = 2,
    Emergency = 3,
}

impl BackpressureLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Normal,
            1 => Self::Warning,
            2 => Self::Critical,
            _ => Self::Emergency,
        }
    }
}

/// Raw load signals sampled by the dispatcher's periodic stats updater.
/// Each is a ratio in `[0.0, 1.0]` except `error_rate`, also `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadSignals {
    pub queue_utilization: f64,
    pub memory_utilization: f64,
    pub error_rate: f64,
}

/// Maps `LoadSignals` to a discrete level plus a continuous throttling
/// factor applied to the rate limiter and batch sizing. Thresholds come
/// from config so operators can tune sensitivity per deployment.
pub struct BackpressureMonitor {
    thresholds: logwarden_config::BackpressureThresholds,
    level: AtomicU8,
}

impl BackpressureMonitor {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            thresholds: config.backpressure.clone(),
            level: AtomicU8::new(BackpressureLevel::Normal as u8),
        }
    }

    pub fn current_level(&self) -> BackpressureLevel {
        BackpressureLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Recomputes the level from fresh signals and stores it. The worst of
    /// the three signals wins: any one tripping Emergency puts the whole
    /// dispatcher in Emergency regardless of the other two.
    pub fn update(&self, signals: LoadSignals) -> BackpressureLevel {
        let queue_level = self.level_for(
            signals.queue_utilization,
            self.thresholds.queue_warning,
            self.thresholds.queue_critical,
            self.thresholds.queue_emergency,
        );
        let memory_level = self.level_for(
            signals.memory_utilization,
            self.thresholds.memory_warning,
            self.thresholds.memory_critical,
            1.0,
        );
        let error_level = self.level_for(
            signals.error_rate,
            self.thresholds.error_rate_warning,
            self.thresholds.error_rate_critical,
            1.0,
        );

        let level = queue_level.max(memory_level).max(error_level);
        self.level.store(level as u8, Ordering::Relaxed);
        BackpressureLevel::from_u8(level as u8)
    }

    fn level_for(&self, value: f64, warning: f64, critical: f64, emergency: f64) -> BackpressureLevel {
        if value >= emergency {
            BackpressureLevel::Emergency
        } else if value >= critical {
            BackpressureLevel::Critical
        } else if value >= warning {
            BackpressureLevel::Warning
        } else {
            BackpressureLevel::Normal
        }
    }

    /// Factor in `[0.0, 1.0]` to multiply admission rate by. Normal passes
    /// everything through; Emergency throttles to a trickle but never to
    /// zero, so the dispatcher can still observe recovery.
    pub fn throttle_factor(&self) -> f64 {
        match self.current_level() {
            BackpressureLevel::Normal => 1.0,
            BackpressureLevel::Warning => 0.75,
            BackpressureLevel::Critical => 0.4,
            BackpressureLevel::Emergency => 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> BackpressureMonitor {
        BackpressureMonitor::new(&DispatcherConfig::default())
    }

    #[test]
    fn normal_load_stays_normal() {
        let m = monitor();
        let level = m.update(LoadSignals {
            queue_utilization: 0.1,
            memory_utilization: 0.1,
            error_rate: 0.0,
        });
        assert_eq!(level, BackpressureLevel::Normal);
        assert_eq!(m.throttle_factor(), 1.0);
    }

    #[test]
    fn worst_signal_wins() {
        let m = monitor();
        let level = m.update(LoadSignals {
            queue_utilization: 0.1,
            memory_utilization: 0.1,
            error_rate: 0.5,
        });
        assert_eq!(level, BackpressureLevel::Emergency);
    }

    #[test]
    fn queue_pressure_escalates_by_threshold() {
        let m = monitor();
        assert_eq!(
            m.update(LoadSignals {
                queue_utilization: 0.80,
                ..Default::default()
            }),
            BackpressureLevel::Warning
        );
        assert_eq!(
            m.update(LoadSignals {
                queue_utilization: 0.92,
                ..Default::default()
            }),
            BackpressureLevel::Critical
        );
        assert_eq!(
            m.update(LoadSignals {
                queue_utilization: 0.97,
                ..Default::default()
            }),
            BackpressureLevel::Emergency
        );
    }
}
