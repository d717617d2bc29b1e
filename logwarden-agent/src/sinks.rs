//! Builds the configured set of sinks and their circuit-breaker tuning from
//! `SinksConfig`. Kept separate from `main` so the wiring is easy to find.

use std::collections::HashMap;
use std::sync::Arc;

use logwarden_config::SinksConfig;
use logwarden_contracts::Sink;
use logwarden_core::circuit_breaker::BreakerSettings;
use logwarden_core::sinks::{FileSink, KafkaSink, LokiSink};

pub async fn build(config: &SinksConfig) -> anyhow::Result<(Vec<Arc<dyn Sink>>, HashMap<String, BreakerSettings>)> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
    let mut breaker_settings = HashMap::new();

    if let Some(loki) = &config.loki {
        let cb = loki.circuit_breaker;
        let sink = LokiSink::new(loki.clone())?;
        breaker_settings.insert(
            sink.name().to_string(),
            BreakerSettings {
                failure_threshold: cb.failure_threshold,
                open_timeout: cb.open_timeout,
                half_open_successes_to_close: cb.half_open_successes_to_close,
                half_open_max_probes: cb.half_open_max_probes as u32,
            },
        );
        sinks.push(Arc::new(sink));
    }

    if let Some(kafka) = &config.kafka {
        let sink = KafkaSink::connect(kafka.clone()).await?;
        sinks.push(Arc::new(sink));
    }

    if let Some(file) = &config.file {
        let sink = FileSink::new(file.clone())?;
        sinks.push(Arc::new(sink));
    }

    Ok((sinks, breaker_settings))
}
