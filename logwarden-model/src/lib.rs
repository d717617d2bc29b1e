//! Shared data model for the logwarden delivery pipeline.
#![allow(missing_docs)]

pub mod batch;
pub mod circuit;
pub mod dispatch_item;
pub mod dlq;
pub mod entry;
pub mod error_kind;
pub mod stream;

pub use batch::Batch;
pub use circuit::CircuitState;
pub use dispatch_item::DispatchItem;
pub use dlq::{CaptureContext, DlqEntry};
pub use entry::{Fields, Labels, LogEntry, LogMessage, SourceType};
pub use error_kind::ErrorKind;
pub use stream::StreamKey;
