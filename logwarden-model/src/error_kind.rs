use serde::{Deserialize, Serialize};
use std::fmt;

/// The error taxonomy surfaced in metrics and DLQ entries (spec §7).
///
/// This is deliberately flat: callers match on it directly rather than
/// walking a trait object, since every consumer (DLQ, stats, retry manager)
/// needs to branch on exactly this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimitExceeded,
    QueueFull,
    ProcessingError,
    TimestampTooOld,
    TimestampTooNew,
    TimestampZero,
    Permanent,
    RateLimited,
    Server,
    Temporary,
    MaxRetriesExceeded,
    RetryQueueOverflow,
    AllSinksFailed,
    DiskFull,
    SizeLimitExceeded,
    BackpressureLowPriority,
}

impl ErrorKind {
    /// Whether an item tagged with this kind should ever be retried. The
    /// false cases all route straight to the DLQ.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Server | ErrorKind::Temporary)
    }

    /// Whether this kind should count against a circuit breaker's failure
    /// threshold. Data errors (bad timestamps, bad payloads) never do —
    /// see spec §4.3 and the design note in §9: classification is what keeps
    /// a stream of permanently-rejected entries from tripping the breaker.
    pub fn counts_as_circuit_fault(self) -> bool {
        matches!(self, ErrorKind::Server | ErrorKind::Temporary)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::QueueFull => "queue_full",
            ErrorKind::ProcessingError => "processing_error",
            ErrorKind::TimestampTooOld => "timestamp_too_old",
            ErrorKind::TimestampTooNew => "timestamp_too_new",
            ErrorKind::TimestampZero => "timestamp_zero",
            ErrorKind::Permanent => "permanent",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Server => "server",
            ErrorKind::Temporary => "temporary",
            ErrorKind::MaxRetriesExceeded => "max_retries_exceeded",
            ErrorKind::RetryQueueOverflow => "retry_queue_overflow",
            ErrorKind::AllSinksFailed => "all_sinks_failed",
            ErrorKind::DiskFull => "disk_full",
            ErrorKind::SizeLimitExceeded => "size_limit_exceeded",
            ErrorKind::BackpressureLowPriority => "backpressure_low_priority",
        };
        f.write_str(s)
    }
}
