use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Config for the central dispatcher (spec §4.1) plus the components it
/// owns directly: backpressure, degradation, dedup, the retry manager, and
/// the DLQ. Sink-specific config lives under `SinksConfig` instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub queue_size: usize,
    pub workers: usize,
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub batch_timeout: Duration,
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub retry_max_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub timestamp_tolerance: Duration,
    #[serde(with = "humantime_serde")]
    pub send_deadline: Duration,

    pub enable_rate_limit: bool,
    pub rate_limit_per_sec: f64,

    pub enable_dedup: bool,
    pub dedup_cache_size: usize,
    #[serde(with = "humantime_serde")]
    pub dedup_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub dedup_time_quantum: Duration,

    pub enable_backpressure: bool,
    pub backpressure: BackpressureThresholds,

    pub enable_degradation: bool,
    pub degradation: DegradationConfig,

    pub enable_dlq: bool,
    pub dlq: DlqConfig,

    pub retry_manager: RetryManagerConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_size: 10_000,
            workers: 8,
            batch_size: 500,
            batch_timeout: Duration::from_secs(5),
            max_retries: 5,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(30),
            timestamp_tolerance: Duration::from_secs(300),
            send_deadline: Duration::from_secs(120),
            enable_rate_limit: true,
            rate_limit_per_sec: 50_000.0,
            enable_dedup: true,
            dedup_cache_size: 100_000,
            dedup_ttl: Duration::from_secs(300),
            dedup_time_quantum: Duration::from_secs(1),
            enable_backpressure: true,
            backpressure: BackpressureThresholds::default(),
            enable_degradation: true,
            degradation: DegradationConfig::default(),
            enable_dlq: true,
            dlq: DlqConfig::default(),
            retry_manager: RetryManagerConfig::default(),
        }
    }
}

/// Thresholds on `[0, 1]` load signals that drive the backpressure monitor's
/// discrete level (spec §4.4).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackpressureThresholds {
    pub queue_warning: f64,
    pub queue_critical: f64,
    pub queue_emergency: f64,
    pub memory_warning: f64,
    pub memory_critical: f64,
    pub error_rate_warning: f64,
    pub error_rate_critical: f64,
}

impl Default for BackpressureThresholds {
    fn default() -> Self {
        Self {
            queue_warning: 0.75,
            queue_critical: 0.90,
            queue_emergency: 0.95,
            memory_warning: 0.75,
            memory_critical: 0.90,
            error_rate_warning: 0.10,
            error_rate_critical: 0.25,
        }
    }
}

/// Feature toggles the degradation controller flips when load crosses a
/// backpressure level (spec §4.4 / Degradation Controller).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    pub skip_dedup_at_critical: bool,
    pub skip_processing_at_critical: bool,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            skip_dedup_at_critical: true,
            skip_processing_at_critical: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DlqConfig {
    pub directory: std::path::PathBuf,
    pub max_entries: usize,
    pub segment_max_bytes: u64,
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self {
            directory: std::path::PathBuf::from("/var/lib/logwarden/dlq"),
            max_entries: 1_000_000,
            segment_max_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryManagerConfig {
    pub min_capacity: usize,
    pub max_capacity: usize,
    pub capacity_ratio_of_main_queue: f64,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub requeue_backoff_on_full: Duration,
}

impl Default for RetryManagerConfig {
    fn default() -> Self {
        Self {
            min_capacity: 1_000,
            max_capacity: 10_000,
            capacity_ratio_of_main_queue: 0.5,
            tick_interval: Duration::from_millis(100),
            requeue_backoff_on_full: Duration::from_millis(50),
        }
    }
}
