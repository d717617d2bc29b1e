use serde::{Deserialize, Serialize};

/// The three states of a circuit breaker protecting a sink. Transition rules
/// live in `logwarden_core::circuit_breaker`; this enum is just the shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

impl Default for CircuitState {
    fn default() -> Self {
        CircuitState::Closed
    }
}
