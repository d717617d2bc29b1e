use std::fmt;

use logwarden_model::ErrorKind;

/// The coarse classification every sink response is reduced to before the
/// circuit breaker or retry manager ever sees it (spec §4.3, §9: "make it a
/// single pure function `classify(status, body) -> ErrorClass`").
///
/// `ErrorClass` is the sink-agnostic shape; each sink has its own
/// `classify` free function that maps its protocol's errors onto this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Success,
    /// Rejected by the backend for a reason that will never change on
    /// retry (bad timestamp, bad auth, malformed request).
    Permanent,
    /// Rejected due to load; back off and retry.
    RateLimited,
    /// The backend itself is unhealthy.
    Server,
    /// Network-level failure: timeout, connection reset, DNS.
    Temporary,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::RateLimited | ErrorClass::Server | ErrorClass::Temporary)
    }

    pub fn counts_as_circuit_fault(self) -> bool {
        matches!(self, ErrorClass::Server | ErrorClass::Temporary)
    }

    pub fn as_error_kind(self) -> Option<ErrorKind> {
        match self {
            ErrorClass::Success => None,
            ErrorClass::Permanent => Some(ErrorKind::Permanent),
            ErrorClass::RateLimited => Some(ErrorKind::RateLimited),
            ErrorClass::Server => Some(ErrorKind::Server),
            ErrorClass::Temporary => Some(ErrorKind::Temporary),
        }
    }
}

/// An error returned by [`crate::sink::Sink::send`].
#[derive(Clone, Debug)]
pub struct SinkError {
    pub class: ErrorClass,
    pub message: String,
    /// Set when the classifier already knows the precise taxonomy kind
    /// (e.g. a timestamp rejection is `ErrorClass::Permanent` but should be
    /// recorded as `ErrorKind::TimestampTooOld`, not the generic
    /// `ErrorKind::Permanent`).
    pub kind_override: Option<ErrorKind>,
}

impl SinkError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self { class, message: message.into(), kind_override: None }
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind_override = Some(kind);
        self
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.kind_override
            .unwrap_or_else(|| self.class.as_error_kind().unwrap_or(ErrorKind::Temporary))
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.class, self.message)
    }
}

impl std::error::Error for SinkError {}
