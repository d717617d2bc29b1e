use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use logwarden_config::{PartitionStrategy, PartitioningConfig};
use logwarden_model::LogEntry;

/// Picks the routing key and partition for one entry (spec §4.12). With
/// partitioning disabled every entry lands on partition 0, matching
/// Kafka's own behavior for a client that never sets a key.
pub fn route(config: &PartitioningConfig, entry: &LogEntry) -> (Option<Vec<u8>>, i32) {
    if !config.enabled {
        return (None, 0);
    }

    let key = match config.strategy {
        PartitionStrategy::SourceId => entry.source_id.clone(),
        PartitionStrategy::Label => config
            .key_field
            .as_deref()
            .and_then(|field| entry.label(field))
            .unwrap_or(&entry.source_id)
            .to_string(),
    };

    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let partition = (hasher.finish() % config.partition_count.max(1) as u64) as i32;

    (Some(key.into_bytes()), partition)
}

/// Which named topic an entry goes to, honoring high/low priority overrides
/// keyed off a `priority` label when configured.
pub fn topic_for<'a>(
    entry: &LogEntry,
    default_topic: &'a str,
    high_priority_topic: Option<&'a str>,
    low_priority_topic: Option<&'a str>,
) -> &'a str {
    match entry.label("priority") {
        Some("high") => high_priority_topic.unwrap_or(default_topic),
        Some("low") => low_priority_topic.unwrap_or(default_topic),
        _ => default_topic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::{Labels, SourceType};

    fn entry(source_id: &str) -> LogEntry {
        LogEntry::new(SourceType::Container, source_id, "m", Labels::new())
    }

    #[test]
    fn disabled_partitioning_always_zero() {
        let config = PartitioningConfig {
            enabled: false,
            ..PartitioningConfig::default()
        };
        let (key, partition) = route(&config, &entry("a"));
        assert_eq!(partition, 0);
        assert!(key.is_none());
    }

    #[test]
    fn same_source_id_routes_to_same_partition() {
        let config = PartitioningConfig {
            partition_count: 16,
            ..PartitioningConfig::default()
        };
        let (_, p1) = route(&config, &entry("source-a"));
        let (_, p2) = route(&config, &entry("source-a"));
        assert_eq!(p1, p2);
    }

    #[test]
    fn priority_label_selects_topic() {
        let mut labels = Labels::new();
        labels.insert("priority".into(), "high".into());
        let entry = LogEntry::new(SourceType::File, "s", "m", labels);

        let topic = topic_for(&entry, "logs", Some("logs-high"), Some("logs-low"));
        assert_eq!(topic, "logs-high");
    }
}
