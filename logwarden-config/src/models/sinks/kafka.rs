use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    Zero,
    One,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KafkaAuthMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaAuthConfig {
    pub mechanism: Option<KafkaAuthMechanism>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub tls: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    SourceId,
    Label,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitioningConfig {
    pub enabled: bool,
    pub strategy: PartitionStrategy,
    pub key_field: Option<String>,
    /// Number of partitions the target topic actually has. The sink hashes
    /// the routing key against this count rather than discovering it from
    /// broker metadata, so it must match the topic's real partition count.
    pub partition_count: i32,
}

impl Default for PartitioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: PartitionStrategy::SourceId,
            key_field: None,
            partition_count: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaDlqRoutingConfig {
    pub enabled: bool,
    pub send_on_error: bool,
    pub send_on_timeout: bool,
}

impl Default for KafkaDlqRoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            send_on_error: true,
            send_on_timeout: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaBackpressureThresholds {
    pub warn: f64,
    pub critical: f64,
    pub emergency: f64,
}

impl Default for KafkaBackpressureThresholds {
    fn default() -> Self {
        Self { warn: 0.75, critical: 0.90, emergency: 0.95 }
    }
}

/// Config for the message-bus sink (spec §4.12).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaSinkConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub high_priority_topic: Option<String>,
    pub low_priority_topic: Option<String>,
    pub compression: CompressionKind,
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub batch_timeout: Duration,
    pub queue_size: usize,
    pub required_acks: AckMode,
    pub retry_max: u32,
    pub partitioning: PartitioningConfig,
    pub auth: KafkaAuthConfig,
    pub dlq_config: KafkaDlqRoutingConfig,
    pub backpressure_config: KafkaBackpressureThresholds,
}

impl Default for KafkaSinkConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            topic: "logs".to_string(),
            high_priority_topic: Some("logs-high-priority".to_string()),
            low_priority_topic: Some("logs-low-priority".to_string()),
            compression: CompressionKind::Zstd,
            batch_size: 500,
            batch_timeout: Duration::from_secs(2),
            queue_size: 10_000,
            required_acks: AckMode::One,
            retry_max: 5,
            partitioning: PartitioningConfig::default(),
            auth: KafkaAuthConfig::default(),
            dlq_config: KafkaDlqRoutingConfig::default(),
            backpressure_config: KafkaBackpressureThresholds::default(),
        }
    }
}
