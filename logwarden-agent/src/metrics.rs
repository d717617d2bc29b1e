//! Prometheus registration for the dispatcher's stats snapshot.
//!
//! The core crate intentionally has no dependency on `prometheus` — it
//! exposes a plain [`logwarden_core::StatsSnapshot`] and leaves registry
//! plumbing to the agent, per spec §1's non-goal on "Prometheus metric
//! registration plumbing".

use logwarden_core::StatsSnapshot;
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};

pub struct MetricsRegistry {
    registry: Registry,
    total_processed: IntGauge,
    error_count: IntGauge,
    duplicate_count: IntGauge,
    rate_limited_count: IntGauge,
    queue_full_count: IntGauge,
    dlq_count: IntGauge,
    retry_count: IntGauge,
    timestamp_drift_count: IntGauge,
    queue_depth: IntGauge,
    retry_queue_depth: IntGauge,
}

impl MetricsRegistry {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        macro_rules! gauge {
            ($name:literal, $help:literal) => {{
                let g = IntGauge::new($name, $help)?;
                registry.register(Box::new(g.clone()))?;
                g
            }};
        }

        Ok(Self {
            total_processed: gauge!("logwarden_total_processed", "entries accepted by the dispatcher"),
            error_count: gauge!("logwarden_error_count", "entries that errored after acceptance"),
            duplicate_count: gauge!("logwarden_duplicate_count", "entries dropped as duplicates"),
            rate_limited_count: gauge!("logwarden_rate_limited_count", "entries rejected by the rate limiter"),
            queue_full_count: gauge!("logwarden_queue_full_count", "entries rejected because the ingress queue was full"),
            dlq_count: gauge!("logwarden_dlq_count", "entries routed to the dead letter queue"),
            retry_count: gauge!("logwarden_retry_count", "delivery attempts scheduled for retry"),
            timestamp_drift_count: gauge!("logwarden_timestamp_drift_count", "entries with a clamped or rejected timestamp"),
            queue_depth: gauge!("logwarden_queue_depth", "current ingress queue depth"),
            retry_queue_depth: gauge!("logwarden_retry_queue_depth", "current retry manager queue depth"),
            registry,
        })
    }

    pub fn update(&self, snapshot: &StatsSnapshot) {
        self.total_processed.set(snapshot.total_processed as i64);
        self.error_count.set(snapshot.error_count as i64);
        self.duplicate_count.set(snapshot.duplicate_count as i64);
        self.rate_limited_count.set(snapshot.rate_limited_count as i64);
        self.queue_full_count.set(snapshot.queue_full_count as i64);
        self.dlq_count.set(snapshot.dlq_count as i64);
        self.retry_count.set(snapshot.retry_count as i64);
        self.timestamp_drift_count.set(snapshot.timestamp_drift_count as i64);
        self.queue_depth.set(snapshot.queue_depth as i64);
        self.retry_queue_depth.set(snapshot.retry_queue_depth as i64);
    }

    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(buf)
    }
}
