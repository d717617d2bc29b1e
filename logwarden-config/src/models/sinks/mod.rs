pub mod file;
pub mod kafka;
pub mod loki;

use serde::{Deserialize, Serialize};

use file::FileSinkConfig;
use kafka::KafkaSinkConfig;
use loki::LokiSinkConfig;

/// Every sink is optional; an agent can be configured to ship to any subset
/// (including all three at once — fan-out is per healthy sink).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub loki: Option<LokiSinkConfig>,
    pub kafka: Option<KafkaSinkConfig>,
    pub file: Option<FileSinkConfig>,
}
