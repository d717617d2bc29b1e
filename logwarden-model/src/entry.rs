use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Labels are kept in a sorted map so that two label sets built from the same
/// key/value pairs always iterate in the same order, regardless of the order
/// collectors inserted them in. Stream-key derivation depends on this.
pub type Labels = BTreeMap<String, String>;

/// Structured payload attached to an entry, opaque to the dispatcher.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Where an entry originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Container,
    File,
    Other,
}

/// A log line's payload. Collectors hand us either raw bytes or text; we keep
/// the distinction instead of lossily decoding at the edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogMessage {
    Text(String),
    Bytes(Vec<u8>),
}

impl LogMessage {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LogMessage::Text(s) => s.as_bytes(),
            LogMessage::Bytes(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lossy text view, used by sinks that must render the message as a
    /// string (the ordered log store's wire format, text-format file output).
    pub fn as_text_lossy(&self) -> std::borrow::Cow<'_, str> {
        match self {
            LogMessage::Text(s) => std::borrow::Cow::Borrowed(s),
            LogMessage::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

impl From<String> for LogMessage {
    fn from(value: String) -> Self {
        LogMessage::Text(value)
    }
}

impl From<&str> for LogMessage {
    fn from(value: &str) -> Self {
        LogMessage::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for LogMessage {
    fn from(value: Vec<u8>) -> Self {
        LogMessage::Bytes(value)
    }
}

/// The unit of work accepted by the dispatcher.
///
/// Ownership: exclusive from acceptance until it is enqueued; from there it
/// is read-only and fanned out to sinks via deep copy (see
/// `LogEntry::clone`, which is a real deep copy since every field is owned).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: LogMessage,
    pub source_type: SourceType,
    pub source_id: String,
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl LogEntry {
    pub fn new(
        source_type: SourceType,
        source_id: impl Into<String>,
        message: impl Into<LogMessage>,
        labels: Labels,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            source_type,
            source_id: source_id.into(),
            labels,
            fields: None,
            processed_at: None,
            trace_id: None,
        }
    }

    /// Stamps the entry as accepted by the dispatcher. Called exactly once,
    /// on the acceptance path.
    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        self.processed_at = Some(at);
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }
}
