mod agent;
mod dispatcher;
mod sinks;

pub use agent::AgentConfig;
pub use dispatcher::{BackpressureThresholds, DegradationConfig, DispatcherConfig, DlqConfig, RetryManagerConfig};
pub use sinks::file::{DiskGuardConfig, FileSinkConfig, OutputFormat, RotationConfig};
pub use sinks::kafka::{
    AckMode, CompressionKind, KafkaAuthConfig, KafkaAuthMechanism, KafkaBackpressureThresholds,
    KafkaDlqRoutingConfig, KafkaSinkConfig, PartitioningConfig, PartitionStrategy,
};
pub use sinks::loki::{
    AdaptiveBatchingConfig, CircuitBreakerConfig, LokiAuthConfig, LokiAuthKind, LokiSinkConfig,
    TimestampLearningConfig,
};
pub use sinks::SinksConfig;
