use chrono::Utc;
use rand::Rng;

use logwarden_model::{DispatchItem, ErrorKind, Labels, LogEntry, LogMessage, SourceType};

use crate::backpressure::BackpressureLevel;
use crate::error::{DispatchError, DispatchResult};
use crate::timestamp_learner::TimestampVerdict;

use super::Dispatcher;

impl Dispatcher {
    /// The single entry point every collector calls (spec §4.1). Runs the
    /// full admission gate synchronously and returns as soon as the entry
    /// is queued (or rejected) — everything past that point is async and
    /// reported through stats and the DLQ, never back to the caller.
    pub fn handle(
        &self,
        source_type: SourceType,
        source_id: impl Into<String>,
        message: impl Into<LogMessage>,
        labels: Labels,
    ) -> DispatchResult<()> {
        if !self.is_running() {
            return Err(DispatchError::NotRunning);
        }

        if self.config.enable_rate_limit && !self.rate_limiter.try_acquire() {
            self.stats.record_rate_limited();
            return Err(DispatchError::RateLimited);
        }

        let mut entry = LogEntry::new(source_type, source_id, message, labels);

        if self.config.enable_backpressure {
            match self.backpressure.current_level() {
                BackpressureLevel::Emergency => {
                    self.stats.record_queue_full();
                    return Err(DispatchError::QueueFull);
                }
                BackpressureLevel::Critical => {
                    // Shed probabilistically rather than all-or-nothing so a
                    // sink recovering mid-critical still gets a trickle of
                    // traffic to prove it's healthy again.
                    let shed_probability = 1.0 - self.backpressure.throttle_factor();
                    if rand::rng().random::<f64>() < shed_probability {
                        entry.set_label("backpressure_low_priority", "true");
                        self.shed_to_dlq(entry);
                        return Ok(());
                    }
                }
                BackpressureLevel::Warning | BackpressureLevel::Normal => {}
            }
        }

        match self.timestamp_learner.validate(entry.timestamp) {
            TimestampVerdict::Zero => entry.timestamp = Utc::now(),
            TimestampVerdict::TooOld | TimestampVerdict::TooNew => {
                self.stats.record_timestamp_drift();
                entry.timestamp = self.timestamp_learner.clamp(entry.timestamp);
            }
            TimestampVerdict::Ok => {}
        }

        if self.config.enable_dedup
            && self.degradation.dedup_enabled()
            && self.dedup.check_and_record(&entry)
        {
            self.stats.record_duplicate();
            return Ok(());
        }

        if self.degradation.processing_enabled() {
            enrich_structured_fields(&mut entry);
        }

        entry.mark_processed(Utc::now());

        match self.ingress_tx.try_send(DispatchItem::new(entry)) {
            Ok(()) => {
                self.stats.record_processed(1);
                Ok(())
            }
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                self.stats.record_queue_full();
                Err(DispatchError::QueueFull)
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => Err(DispatchError::NotRunning),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::Acquire)
    }

    /// Routes an entry rejected under critical backpressure straight to the
    /// DLQ instead of the caller — per spec §4.1 step 3, a shed entry is
    /// never silently dropped, but the caller doesn't see an error either.
    fn shed_to_dlq(&self, entry: LogEntry) {
        let dlq_entry = logwarden_model::DlqEntry::new(
            entry,
            "shed under critical backpressure",
            ErrorKind::BackpressureLowPriority,
            "dispatcher",
            0,
            "dispatcher",
        );
        self.stats.record_dlq();
        if let Err(err) = self.dlq.append(&dlq_entry) {
            tracing::error!(error = %err, "failed to persist backpressure-shed entry to dead-letter queue");
        }
    }
}

/// Best-effort structured extraction: if a text message parses as a JSON
/// object, its fields ride alongside the raw message instead of forcing
/// downstream consumers to re-parse it. Skipped entirely under
/// backpressure via the degradation controller (spec §4.4).
fn enrich_structured_fields(entry: &mut LogEntry) {
    if entry.fields.is_some() {
        return;
    }
    let LogMessage::Text(text) = &entry.message else {
        return;
    };
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text) {
        entry.fields = Some(map);
    }
}
