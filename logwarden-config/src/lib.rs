//! Configuration loading for the logwarden agent.
//!
//! Recognized options mirror spec §6: a TOML file on disk, overridable by
//! environment variables prefixed `LOGWARDEN_`, with CLI flags (see
//! [`cli::Cli`]) taking final precedence. Loading is fail-fast: a malformed
//! config aborts startup rather than falling back to defaults silently.

pub mod cli;
pub mod error;
pub mod loader;
pub mod models;

pub use error::ConfigError;
pub use loader::load;
pub use models::{
    AckMode, AdaptiveBatchingConfig, AgentConfig, BackpressureThresholds, CircuitBreakerConfig,
    CompressionKind, DegradationConfig, DispatcherConfig, DiskGuardConfig, DlqConfig, FileSinkConfig,
    KafkaAuthConfig, KafkaAuthMechanism, KafkaBackpressureThresholds, KafkaDlqRoutingConfig,
    KafkaSinkConfig, LokiAuthConfig, LokiAuthKind, LokiSinkConfig, OutputFormat,
    PartitionStrategy, PartitioningConfig, RetryManagerConfig, RotationConfig, SinksConfig,
    TimestampLearningConfig,
};
