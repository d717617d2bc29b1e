use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::LogEntry;
use crate::error_kind::ErrorKind;

/// Who captured a DLQ entry and when, for later debugging of a replay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptureContext {
    pub worker_id: String,
    pub captured_at: DateTime<Utc>,
}

impl CaptureContext {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            captured_at: Utc::now(),
        }
    }
}

/// A [`LogEntry`] that failed permanently or overflowed a bound somewhere in
/// the pipeline, plus enough context to debug or replay it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DlqEntry {
    pub entry: LogEntry,
    pub error_message: String,
    pub error_type: ErrorKind,
    pub failed_sink: String,
    pub retry_count: u32,
    pub context: CaptureContext,
}

impl DlqEntry {
    pub fn new(
        entry: LogEntry,
        error_message: impl Into<String>,
        error_type: ErrorKind,
        failed_sink: impl Into<String>,
        retry_count: u32,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            entry,
            error_message: error_message.into(),
            error_type,
            failed_sink: failed_sink.into(),
            retry_count,
            context: CaptureContext::new(worker_id),
        }
    }
}
