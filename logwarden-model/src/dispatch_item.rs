use chrono::{DateTime, Utc};

use crate::entry::LogEntry;

/// Wraps a [`LogEntry`] with the bookkeeping the retry manager needs.
///
/// Lifecycle: created at acceptance, consumed by a worker, then destroyed on
/// success or DLQ admission. Never cloned across retry attempts in place —
/// the retry manager deep-copies the wrapped entry when it re-arms one, so a
/// worker holding a stale reference can't race a retried copy.
#[derive(Clone, Debug)]
pub struct DispatchItem {
    pub entry: LogEntry,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl DispatchItem {
    pub fn new(entry: LogEntry) -> Self {
        Self {
            entry,
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    pub fn for_retry(entry: LogEntry, retry_count: u32) -> Self {
        Self {
            entry,
            retry_count,
            enqueued_at: Utc::now(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.enqueued_at
    }
}
