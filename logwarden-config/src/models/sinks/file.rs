use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFormat {
    Structured,
    Text {
        field_separator: String,
        timestamp_format: String,
    },
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Structured
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub max_size_mb: u64,
    pub max_files: usize,
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { max_size_mb: 256, max_files: 10, compress: true }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskGuardConfig {
    pub max_total_disk_gb: f64,
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,
    pub cleanup_threshold_percent: f64,
    pub emergency_cleanup_enabled: bool,
}

impl Default for DiskGuardConfig {
    fn default() -> Self {
        Self {
            max_total_disk_gb: 50.0,
            check_interval: Duration::from_secs(30),
            cleanup_threshold_percent: 90.0,
            emergency_cleanup_enabled: true,
        }
    }
}

/// Config for the local-file sink (spec §4.13).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    pub directory: PathBuf,
    pub filename_pattern: String,
    pub output_format: OutputFormat,
    pub rotation: RotationConfig,
    pub disk_guard: DiskGuardConfig,
    pub max_open_files: usize,
    pub queue_size: usize,
    pub worker_count: usize,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/log/logwarden"),
            filename_pattern: "{source_id}-{date}.log".to_string(),
            output_format: OutputFormat::default(),
            rotation: RotationConfig::default(),
            disk_guard: DiskGuardConfig::default(),
            max_open_files: 256,
            queue_size: 10_000,
            worker_count: 4,
        }
    }
}
