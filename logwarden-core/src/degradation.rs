use std::sync::atomic::{AtomicBool, Ordering};

use logwarden_config::DegradationConfig;

use crate::backpressure::BackpressureLevel;

/// Flips feature flags off under load so the dispatcher sheds optional work
/// before it sheds log entries (spec §4.4, Degradation Controller). Flags
/// only ever turn back on once the level drops back below Critical.
pub struct DegradationController {
    config: DegradationConfig,
    dedup_enabled: AtomicBool,
    processing_enabled: AtomicBool,
}

impl DegradationController {
    pub fn new(config: DegradationConfig) -> Self {
        Self {
            config,
            dedup_enabled: AtomicBool::new(true),
            processing_enabled: AtomicBool::new(true),
        }
    }

    pub fn apply(&self, level: BackpressureLevel) {
        let shed = level >= BackpressureLevel::Critical;

        if self.config.skip_dedup_at_critical {
            self.dedup_enabled.store(!shed, Ordering::Relaxed);
        }
        if self.config.skip_processing_at_critical {
            self.processing_enabled.store(!shed, Ordering::Relaxed);
        }
    }

    pub fn dedup_enabled(&self) -> bool {
        self.dedup_enabled.load(Ordering::Relaxed)
    }

    pub fn processing_enabled(&self) -> bool {
        self.processing_enabled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheds_optional_work_at_critical() {
        let ctrl = DegradationController::new(DegradationConfig {
            skip_dedup_at_critical: true,
            skip_processing_at_critical: true,
        });
        ctrl.apply(BackpressureLevel::Critical);
        assert!(!ctrl.dedup_enabled());
        assert!(!ctrl.processing_enabled());
    }

    #[test]
    fn recovers_once_below_critical() {
        let ctrl = DegradationController::new(DegradationConfig {
            skip_dedup_at_critical: true,
            skip_processing_at_critical: true,
        });
        ctrl.apply(BackpressureLevel::Emergency);
        ctrl.apply(BackpressureLevel::Warning);
        assert!(ctrl.dedup_enabled());
        assert!(ctrl.processing_enabled());
    }

    #[test]
    fn respects_disabled_flags() {
        let ctrl = DegradationController::new(DegradationConfig {
            skip_dedup_at_critical: false,
            skip_processing_at_critical: true,
        });
        ctrl.apply(BackpressureLevel::Emergency);
        assert!(ctrl.dedup_enabled());
        assert!(!ctrl.processing_enabled());
    }
}
