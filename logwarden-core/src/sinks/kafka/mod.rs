mod routing;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder, Credentials, SaslConfig};
use rskafka::record::Record;
use tokio::sync::RwLock;

use logwarden_config::{CompressionKind, KafkaAuthMechanism, KafkaSinkConfig};
use logwarden_contracts::{ErrorClass, Sink, SinkError, SinkOutcome};
use logwarden_model::Batch;

/// Message-bus sink (spec §4.12). Backed by `rskafka`, a pure-Rust client,
/// chosen specifically so this sink never pulls in `librdkafka`'s native
/// build dependency (cmake, a C toolchain) — see `DESIGN.md`.
pub struct KafkaSink {
    config: KafkaSinkConfig,
    client: Client,
    partition_clients: RwLock<HashMap<(String, i32), Arc<PartitionClient>>>,
    healthy: AtomicBool,
}

impl KafkaSink {
    pub async fn connect(config: KafkaSinkConfig) -> anyhow::Result<Self> {
        let mut builder = ClientBuilder::new(config.brokers.clone());

        if let Some(mechanism) = config.auth.mechanism {
            let user = config.auth.user.clone().unwrap_or_default();
            let pass = config.auth.pass.clone().unwrap_or_default();
            let sasl = match mechanism {
                KafkaAuthMechanism::Plain => SaslConfig::Plain(Credentials::new(user, pass)),
                KafkaAuthMechanism::ScramSha256 => SaslConfig::ScramSha256(Credentials::new(user, pass)),
                KafkaAuthMechanism::ScramSha512 => SaslConfig::ScramSha512(Credentials::new(user, pass)),
            };
            builder = builder.sasl_config(sasl);
        }

        let client = builder.build().await?;

        Ok(Self {
            config,
            client,
            partition_clients: RwLock::new(HashMap::new()),
            healthy: AtomicBool::new(true),
        })
    }

    async fn partition_client_for(&self, topic: &str, partition: i32) -> anyhow::Result<Arc<PartitionClient>> {
        let key = (topic.to_string(), partition);

        if let Some(client) = self.partition_clients.read().await.get(&key) {
            return Ok(Arc::clone(client));
        }

        let mut clients = self.partition_clients.write().await;
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(
            self.client
                .partition_client(topic, partition, UnknownTopicHandling::Retry)
                .await?,
        );
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    fn compression(&self) -> Compression {
        match self.config.compression {
            CompressionKind::None => Compression::NoCompression,
            CompressionKind::Gzip => Compression::Gzip,
            CompressionKind::Snappy => Compression::Snappy,
            CompressionKind::Lz4 => Compression::Lz4,
            CompressionKind::Zstd => Compression::Zstd,
        }
    }
}

#[async_trait]
impl Sink for KafkaSink {
    fn name(&self) -> &str {
        "kafka"
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

        let mut by_destination: HashMap<(String, i32), Vec<Record>> = HashMap::new();

        for entry in &batch.entries {
            let topic = routing::topic_for(
                entry,
                &self.config.topic,
                self.config.high_priority_topic.as_deref(),
                self.config.low_priority_topic.as_deref(),
            )
            .to_string();
            let (key, partition) = routing::route(&self.config.partitioning, entry);

            let mut headers = BTreeMap::new();
            headers.insert("source_type".to_string(), format!("{:?}", entry.source_type).into_bytes());

            let record = Record {
                key,
                value: Some(entry.message.as_bytes().to_vec()),
                headers,
                timestamp: entry.timestamp,
            };

            by_destination.entry((topic, partition)).or_default().push(record);
        }

        let mut accepted = 0;
        for ((topic, partition), records) in by_destination {
            let count = records.len();
            let partition_client = self
                .partition_client_for(&topic, partition)
                .await
                .map_err(|e| {
                    self.healthy.store(false, Ordering::Relaxed);
                    SinkError::new(ErrorClass::Temporary, e.to_string())
                })?;

            partition_client
                .produce(records, self.compression())
                .await
                .map_err(|e| {
                    self.healthy.store(false, Ordering::Relaxed);
                    SinkError::new(ErrorClass::Server, e.to_string())
                })?;

            accepted += count;
        }

        self.healthy.store(true, Ordering::Relaxed);
        Ok(SinkOutcome { accepted })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
