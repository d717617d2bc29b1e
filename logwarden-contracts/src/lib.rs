//! Trait surfaces shared between the dispatcher and its sinks.

pub mod error_class;
pub mod sink;

pub use error_class::{ErrorClass, SinkError};
pub use sink::{Sink, SinkOutcome};
