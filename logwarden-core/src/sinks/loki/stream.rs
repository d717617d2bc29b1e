use std::collections::HashMap;

use logwarden_model::{Batch, Labels, StreamKey};
use regex::Regex;
use std::sync::LazyLock;

/// Loki-compatible label names: `[a-zA-Z_][a-zA-Z0-9_]*`. Labels that don't
/// match are dropped rather than sent and rejected wholesale by the
/// backend — one bad label shouldn't sink an entire stream's entries.
static VALID_LABEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

/// One line within a stream: nanosecond timestamp plus rendered text.
pub struct StreamLine {
    pub timestamp_nanos: i64,
    pub line: String,
}

/// Groups a batch's entries by their merged, sanitized label set (spec
/// §4.11). Grouping must be insertion-order independent — two entries
/// whose labels were built in different orders still land in the same
/// stream — which [`StreamKey::from_labels`] guarantees via its sorted map.
pub fn group_into_streams(batch: &Batch, default_labels: &Labels) -> HashMap<StreamKey, (Labels, Vec<StreamLine>)> {
    let mut streams: HashMap<StreamKey, (Labels, Vec<StreamLine>)> = HashMap::new();

    for entry in &batch.entries {
        let merged = merge_and_sanitize(default_labels, &entry.labels);
        let key = StreamKey::from_labels(&merged);

        let line = StreamLine {
            timestamp_nanos: entry.timestamp.timestamp_nanos_opt().unwrap_or(0),
            line: entry.message.as_text_lossy().into_owned(),
        };

        streams.entry(key).or_insert_with(|| (merged, Vec::new())).1.push(line);
    }

    for (_, lines) in streams.values_mut() {
        lines.sort_by_key(|l| l.timestamp_nanos);
    }

    streams
}

fn merge_and_sanitize(default_labels: &Labels, entry_labels: &Labels) -> Labels {
    let mut merged = default_labels.clone();
    merged.extend(entry_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.retain(|k, _| VALID_LABEL_NAME.is_match(k));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::{LogEntry, SourceType};

    fn labeled_entry(message: &str, labels: &[(&str, &str)]) -> LogEntry {
        let map: Labels = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        LogEntry::new(SourceType::Container, "c1", message, map)
    }

    #[test]
    fn entries_with_same_labels_share_a_stream() {
        let mut batch = Batch::new();
        batch.push(labeled_entry("a", &[("app", "web"), ("env", "prod")]));
        batch.push(labeled_entry("b", &[("env", "prod"), ("app", "web")]));

        let streams = group_into_streams(&batch, &Labels::new());
        assert_eq!(streams.len(), 1);
        let (_, lines) = streams.values().next().unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn invalid_label_names_are_dropped() {
        let mut batch = Batch::new();
        batch.push(labeled_entry("a", &[("app", "web"), ("bad-label!", "x")]));

        let streams = group_into_streams(&batch, &Labels::new());
        let (labels, _) = streams.values().next().unwrap();
        assert!(!labels.contains_key("bad-label!"));
        assert!(labels.contains_key("app"));
    }

    #[test]
    fn default_labels_are_merged_in() {
        let mut batch = Batch::new();
        batch.push(labeled_entry("a", &[("app", "web")]));

        let mut defaults = Labels::new();
        defaults.insert("cluster".to_string(), "us-east".to_string());

        let streams = group_into_streams(&batch, &defaults);
        let (labels, _) = streams.values().next().unwrap();
        assert_eq!(labels.get("cluster").map(String::as_str), Some("us-east"));
    }
}
