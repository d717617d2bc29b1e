use thiserror::Error;

/// Errors the dispatcher can return synchronously from `Handle` (spec §4.1).
/// Everything that happens after enqueue never surfaces here — it manifests
/// via stats and the DLQ instead (spec §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatcher is not running")]
    NotRunning,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("queue is full")]
    QueueFull,

    #[error("context cancelled")]
    ContextCancelled,

    #[error("processing error: {0}")]
    Processing(String),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
