use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::models::AgentConfig;

/// Loads `AgentConfig` from a TOML file, then applies any `LOGWARDEN_*`
/// environment overrides recognized below. CLI flags are applied by the
/// caller afterwards (see [`crate::cli::Cli::apply`]) since they need
/// `clap`'s own parsing, not ours.
pub fn load(path: impl AsRef<Path>) -> Result<AgentConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut config: AgentConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(ConfigError::Invalid)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut AgentConfig) {
    if let Ok(level) = std::env::var("LOGWARDEN_LOG_LEVEL") {
        config.log_level = level;
    }
    if let Ok(addr) = std::env::var("LOGWARDEN_METRICS_ADDR") {
        config.metrics_addr = Some(addr);
    }
    if let Ok(workers) = std::env::var("LOGWARDEN_DISPATCHER_WORKERS") {
        if let Ok(n) = workers.parse() {
            config.dispatcher.workers = n;
        }
    }
    if let Ok(url) = std::env::var("LOGWARDEN_LOKI_URL") {
        if let Some(loki) = config.sinks.loki.as_mut() {
            loki.url = url;
        }
    }
    if let Ok(token) = std::env::var("LOGWARDEN_LOKI_TOKEN") {
        if let Some(loki) = config.sinks.loki.as_mut() {
            loki.auth.token = Some(token);
        }
    }
    if let Ok(brokers) = std::env::var("LOGWARDEN_KAFKA_BROKERS") {
        if let Some(kafka) = config.sinks.kafka.as_mut() {
            kafka.brokers = brokers.split(',').map(str::trim).map(str::to_owned).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_config_with_defaults_filled_in() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [sinks.loki]
            url = "http://loki:3100"
            "#
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.dispatcher.workers, 8);
        assert_eq!(config.sinks.loki.unwrap().url, "http://loki:3100");
    }

    #[test]
    fn rejects_config_with_no_sinks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "log_level = \"debug\"\n").unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn env_override_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [sinks.loki]
            url = "http://loki:3100"
            "#
        )
        .unwrap();

        // SAFETY: test runs single-threaded with respect to this env var.
        unsafe { std::env::set_var("LOGWARDEN_DISPATCHER_WORKERS", "32") };
        let config = load(file.path()).unwrap();
        unsafe { std::env::remove_var("LOGWARDEN_DISPATCHER_WORKERS") };

        assert_eq!(config.dispatcher.workers, 32);
    }
}
