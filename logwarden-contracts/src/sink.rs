use async_trait::async_trait;
use logwarden_model::Batch;

use crate::error_class::SinkError;

/// Per-sink result of a single `send` call, used by the batch processor to
/// total up successes without re-deriving them from the batch length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkOutcome {
    pub accepted: usize,
}

/// The narrow contract every delivery destination implements. The
/// dispatcher and retry manager only ever see sinks through this trait —
/// they have no idea whether they're talking to an HTTP log store, a
/// message-bus producer, or a file on disk.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Starts any background workers/connections the sink owns. Called once
    /// before the sink is handed its first batch.
    async fn start(&self) -> anyhow::Result<()>;

    /// Stops background workers and releases resources. Best-effort: the
    /// caller bounds how long it waits (see the agent's shutdown sequence).
    async fn stop(&self) -> anyhow::Result<()>;

    /// Delivers a batch. Implementations own their own batching/retry
    /// internals (e.g. the ordered-log-store sink's adaptive batching) but
    /// from the dispatcher's perspective this call is atomic: it either
    /// reports full acceptance or returns the first classified error.
    async fn send(&self, batch: &Batch) -> Result<SinkOutcome, SinkError>;

    /// Cheap, non-blocking health read used to decide whether a sink
    /// participates in the next fan-out round.
    fn is_healthy(&self) -> bool;
}
