use serde::{Deserialize, Serialize};

use super::dispatcher::DispatcherConfig;
use super::sinks::SinksConfig;

/// Top-level config for the agent binary. Mirrors the recognized-options
/// list in spec §6; everything else (CLI parsing, YAML/TOML loading
/// mechanics) is the agent's concern, not the core's.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub log_level: String,
    pub metrics_addr: Option<String>,
    pub dispatcher: DispatcherConfig,
    pub sinks: SinksConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_addr: Some("0.0.0.0:9898".to_string()),
            dispatcher: DispatcherConfig::default(),
            sinks: SinksConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Fatal configuration invariants surface here, at startup, per spec §7
    /// ("Fatal errors (configuration invariants) surface at startup and
    /// abort initialization").
    pub fn validate(&self) -> Result<(), String> {
        if self.dispatcher.workers == 0 {
            return Err("dispatcher.workers must be >= 1".to_string());
        }
        if self.dispatcher.queue_size == 0 {
            return Err("dispatcher.queue_size must be >= 1".to_string());
        }
        if self.dispatcher.batch_size == 0 {
            return Err("dispatcher.batch_size must be >= 1".to_string());
        }
        if self.sinks.loki.is_none() && self.sinks.kafka.is_none() && self.sinks.file.is_none() {
            return Err("at least one sink must be configured".to_string());
        }
        if let Some(loki) = &self.sinks.loki {
            if loki.url.is_empty() {
                return Err("sinks.loki.url must not be empty".to_string());
            }
        }
        if let Some(kafka) = &self.sinks.kafka {
            if kafka.brokers.is_empty() {
                return Err("sinks.kafka.brokers must not be empty".to_string());
            }
        }
        if let Some(file) = &self.sinks.file {
            if file.max_open_files == 0 {
                return Err("sinks.file.max_open_files must be >= 1".to_string());
            }
        }
        Ok(())
    }
}
