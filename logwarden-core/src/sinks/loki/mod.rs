mod classify;
mod stream;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use serde::Serialize;

use logwarden_config::LokiSinkConfig;
use logwarden_contracts::{ErrorClass, Sink, SinkError, SinkOutcome};
use logwarden_model::Batch;

pub use classify::{classify, kind_hint};

/// Ordered log store sink (spec §4.11), speaking a Loki-compatible push
/// API: group by label stream, gzip the JSON payload, POST, classify the
/// response. One HTTP client shared across all sends so connection pooling
/// (`max_connections_per_host`) actually pools.
pub struct LokiSink {
    config: LokiSinkConfig,
    client: reqwest::Client,
    healthy: AtomicBool,
}

#[derive(Serialize)]
struct PushRequest {
    streams: Vec<PushStream>,
}

#[derive(Serialize)]
struct PushStream {
    stream: logwarden_model::Labels,
    values: Vec<[String; 2]>,
}

impl LokiSink {
    pub fn new(config: LokiSinkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_connections_per_host)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            client,
            healthy: AtomicBool::new(true),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.url.trim_end_matches('/'),
            self.config.push_endpoint
        )
    }

    fn build_payload(&self, batch: &Batch) -> anyhow::Result<Vec<u8>> {
        let streams = stream::group_into_streams(batch, &self.config.default_labels);
        let request = PushRequest {
            streams: streams
                .into_values()
                .map(|(labels, lines)| PushStream {
                    stream: labels,
                    values: lines
                        .into_iter()
                        .map(|l| [l.timestamp_nanos.to_string(), l.line])
                        .collect(),
                })
                .collect(),
        };

        let json = serde_json::to_vec(&request)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    fn auth_headers(&self) -> anyhow::Result<HeaderMap> {
        use logwarden_config::LokiAuthKind;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));

        if let Some(tenant) = &self.config.tenant_id {
            headers.insert(
                HeaderName::from_static("x-scope-orgid"),
                HeaderValue::from_str(tenant)?,
            );
        }

        match self.config.auth.kind {
            Some(LokiAuthKind::Bearer) => {
                if let Some(token) = &self.config.auth.token {
                    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
                }
            }
            Some(LokiAuthKind::Basic) => {
                if let (Some(user), Some(pass)) = (&self.config.auth.user, &self.config.auth.pass) {
                    use base64::Engine;
                    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
                    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Basic {encoded}"))?);
                }
            }
            Some(LokiAuthKind::None) | None => {}
        }

        for (key, value) in &self.config.headers {
            if let (Ok(name), Ok(val)) = (HeaderName::try_from(key.as_str()), HeaderValue::from_str(value)) {
                headers.insert(name, val);
            }
        }

        Ok(headers)
    }
}

#[async_trait]
impl Sink for LokiSink {
    fn name(&self) -> &str {
        "loki"
    }

    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send(&self, batch: &Batch) -> Result<SinkOutcome, SinkError> {
        if batch.is_empty() {
            return Ok(SinkOutcome { accepted: 0 });
        }

        let payload = self
            .build_payload(batch)
            .map_err(|e| SinkError::new(ErrorClass::Permanent, e.to_string()))?;
        let headers = self
            .auth_headers()
            .map_err(|e| SinkError::new(ErrorClass::Permanent, e.to_string()))?;

        let response = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                self.healthy.store(false, Ordering::Relaxed);
                SinkError::new(ErrorClass::Temporary, e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let class = classify::classify(status, &body);

        self.healthy.store(class != ErrorClass::Server, Ordering::Relaxed);

        if class == ErrorClass::Success {
            return Ok(SinkOutcome { accepted: batch.len() });
        }

        let mut err = SinkError::new(class, format!("push returned {status}: {body}"));
        if let Some(kind) = classify::kind_hint(status, &body) {
            err = err.with_kind(kind);
        }
        Err(err)
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
