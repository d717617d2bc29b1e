use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;

/// Per-sink delivery counters. Kept separate from the dispatcher-wide
/// counters so a slow or failing sink doesn't obscure the others in a
/// snapshot.
#[derive(Default)]
struct SinkCounters {
    sent: AtomicU64,
    failed: AtomicU64,
}

/// Owned by the dispatcher, read by the stats updater task and by anyone
/// who wants a point-in-time view (e.g. the agent's `/metrics` handler).
/// Replaces the "global mutable counters" pattern the source this was
/// generalized from used — see `DESIGN.md`.
#[derive(Default)]
pub struct DispatcherStats {
    total_processed: AtomicU64,
    total_errors: AtomicU64,
    total_duplicates: AtomicU64,
    total_rate_limited: AtomicU64,
    total_queue_full: AtomicU64,
    total_dlq: AtomicU64,
    total_retries: AtomicU64,
    total_timestamp_drift: AtomicU64,
    queue_depth: AtomicUsize,
    retry_queue_depth: AtomicUsize,
    per_sink: DashMap<String, SinkCounters>,
}

/// Read-only point-in-time view, the only thing ever handed to callers.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct StatsSnapshot {
    pub total_processed: u64,
    pub error_count: u64,
    pub duplicate_count: u64,
    pub rate_limited_count: u64,
    pub queue_full_count: u64,
    pub dlq_count: u64,
    pub retry_count: u64,
    pub timestamp_drift_count: u64,
    pub queue_depth: usize,
    pub retry_queue_depth: usize,
    pub per_sink: HashMap<String, SinkSnapshot>,
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct SinkSnapshot {
    pub sent: u64,
    pub failed: u64,
}

impl DispatcherStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self, n: u64) {
        self.total_processed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.total_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.total_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_full(&self) {
        self.total_queue_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dlq(&self) {
        self.total_dlq.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.total_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timestamp_drift(&self) {
        self.total_timestamp_drift.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_queue_depth(&self, depth: usize) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn set_retry_queue_depth(&self, depth: usize) {
        self.retry_queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn record_sink_sent(&self, sink: &str, n: u64) {
        self.per_sink
            .entry(sink.to_string())
            .or_default()
            .sent
            .fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_sink_failed(&self, sink: &str, n: u64) {
        self.per_sink
            .entry(sink.to_string())
            .or_default()
            .failed
            .fetch_add(n, Ordering::Relaxed);
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn retry_queue_depth(&self) -> usize {
        self.retry_queue_depth.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let per_sink = self
            .per_sink
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    SinkSnapshot {
                        sent: entry.value().sent.load(Ordering::Relaxed),
                        failed: entry.value().failed.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();

        StatsSnapshot {
            total_processed: self.total_processed.load(Ordering::Relaxed),
            error_count: self.total_errors.load(Ordering::Relaxed),
            duplicate_count: self.total_duplicates.load(Ordering::Relaxed),
            rate_limited_count: self.total_rate_limited.load(Ordering::Relaxed),
            queue_full_count: self.total_queue_full.load(Ordering::Relaxed),
            dlq_count: self.total_dlq.load(Ordering::Relaxed),
            retry_count: self.total_retries.load(Ordering::Relaxed),
            timestamp_drift_count: self.total_timestamp_drift.load(Ordering::Relaxed),
            queue_depth: self.queue_depth(),
            retry_queue_depth: self.retry_queue_depth(),
            per_sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let stats = DispatcherStats::new();
        stats.record_processed(1000);
        stats.record_error();
        stats.record_sink_sent("loki", 900);
        stats.record_sink_failed("loki", 5);

        let snap = stats.snapshot();
        assert_eq!(snap.total_processed, 1000);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.per_sink["loki"].sent, 900);
        assert_eq!(snap.per_sink["loki"].failed, 5);
    }
}
