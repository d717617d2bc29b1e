use chrono::{DateTime, Utc};

use crate::entry::LogEntry;

/// A bounded, ordered sequence of entries destined for one sink.
///
/// Invariants upheld by the batch processor, not by this type: `len() <=
/// batch_size` and `age() <= batch_timeout` at flush time. `Batch` itself
/// just accumulates; it has no notion of its own limits.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub entries: Vec<LogEntry>,
    created_at: Option<DateTime<Utc>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self.created_at {
            Some(created_at) => now - created_at,
            None => chrono::Duration::zero(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Deep-copies the batch for fan-out to a sink. Every field here is
    /// owned, so `Clone` already is a deep copy; this exists to make that
    /// fact explicit at call sites that rely on it for correctness.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }
}

impl FromIterator<LogEntry> for Batch {
    fn from_iter<T: IntoIterator<Item = LogEntry>>(iter: T) -> Self {
        let mut batch = Batch::new();
        for entry in iter {
            batch.push(entry);
        }
        batch
    }
}
