use std::collections::HashMap;
use std::time::Duration;

use logwarden_model::Labels;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LokiAuthKind {
    None,
    Basic,
    Bearer,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LokiAuthConfig {
    pub kind: Option<LokiAuthKind>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampLearningConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub default_max_age: Duration,
    pub clamp_enabled: bool,
    pub learn_from_errors: bool,
    #[serde(with = "humantime_serde")]
    pub min_learning_window: Duration,
}

impl Default for TimestampLearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_max_age: Duration::from_secs(24 * 3600),
            clamp_enabled: true,
            learn_from_errors: true,
            min_learning_window: Duration::from_secs(300),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveBatchingConfig {
    pub enabled: bool,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub min_flush_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_flush_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub adaptation_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub latency_threshold: Duration,
    pub throughput_target_per_sec: f64,
}

impl Default for AdaptiveBatchingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_batch_size: 100,
            max_batch_size: 5_000,
            min_flush_delay: Duration::from_millis(200),
            max_flush_delay: Duration::from_secs(5),
            adaptation_interval: Duration::from_secs(10),
            latency_threshold: Duration::from_millis(500),
            throughput_target_per_sec: 10_000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    #[serde(with = "humantime_serde")]
    pub open_timeout: Duration,
    pub half_open_successes_to_close: u32,
    pub half_open_max_probes: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 15,
            open_timeout: Duration::from_secs(60),
            half_open_successes_to_close: 3,
            half_open_max_probes: 2,
        }
    }
}

/// Config for the ordered-log-store sink (spec §4.11), modeled after a
/// Loki-compatible push API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LokiSinkConfig {
    pub url: String,
    pub push_endpoint: String,
    pub tenant_id: Option<String>,
    pub auth: LokiAuthConfig,
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub batch_timeout: Duration,
    pub queue_size: usize,
    pub headers: HashMap<String, String>,
    pub default_labels: Labels,
    pub timestamp_learning: TimestampLearningConfig,
    pub adaptive_batching: AdaptiveBatchingConfig,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub worker_count: usize,
    pub max_connections_per_host: usize,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for LokiSinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3100".to_string(),
            push_endpoint: "/loki/api/v1/push".to_string(),
            tenant_id: None,
            auth: LokiAuthConfig::default(),
            batch_size: 1_000,
            batch_timeout: Duration::from_secs(5),
            queue_size: 10_000,
            headers: HashMap::new(),
            default_labels: Labels::new(),
            timestamp_learning: TimestampLearningConfig::default(),
            adaptive_batching: AdaptiveBatchingConfig::default(),
            timeout: Duration::from_secs(30),
            worker_count: 10,
            max_connections_per_host: 20,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}
