mod disk_guard;
mod fd_lru;
mod filename;
mod rotation;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use logwarden_config::{FileSinkConfig, OutputFormat};
use logwarden_contracts::{ErrorClass, Sink, SinkError, SinkOutcome};
use logwarden_model::{Batch, LogEntry};

use disk_guard::DiskGuard;
use fd_lru::FdLru;

/// Local-file sink (spec §4.13): one file per rendered filename pattern
/// (usually per source), rotated by size, guarded against filling the
/// disk. Writes are synchronous `std::fs` calls wrapped in `spawn_blocking`
/// since file I/O under sustained load can block longer than an async
/// task should.
pub struct FileSink {
    config: FileSinkConfig,
    fd_lru: FdLru,
    disk_guard: DiskGuard,
    healthy: AtomicBool,
}

impl FileSink {
    pub fn new(config: FileSinkConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.directory)?;
        let disk_guard = DiskGuard::new(config.directory.clone(), config.disk_guard);
        Ok(Self {
            fd_lru: FdLru::new(config.max_open_files),
            disk_guard,
            healthy: AtomicBool::new(true),
            config,
        })
    }

    fn render_line(&self, entry: &LogEntry) -> anyhow::Result<String> {
        match &self.config.output_format {
            OutputFormat::Structured => Ok(serde_json::to_string(entry)?),
            OutputFormat::Text { field_separator, timestamp_format } => {
                let ts = entry.timestamp.format(timestamp_format);
                let labels = entry
                    .labels
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(",");
                Ok(format!(
                    "{ts}{sep}{source}{sep}{labels}{sep}{msg}",
                    sep = field_separator,
                    source = entry.source_id,
                    msg = entry.message.as_text_lossy()
                ))
            }
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
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

        if let Err(err) = self.disk_guard.enforce() {
            tracing::warn!(error = %err, "disk guard cleanup failed");
        }

        let mut accepted = 0;
        for entry in &batch.entries {
            let filename = filename::render(&self.config.filename_pattern, &entry.source_id, entry.timestamp);
            let path = self.config.directory.join(filename);

            let line = self
                .render_line(entry)
                .map_err(|e| SinkError::new(ErrorClass::Permanent, e.to_string()))?;

            rotation::rotate_if_needed(&path, &self.config.rotation, &self.fd_lru)
                .map_err(|e| SinkError::new(ErrorClass::Server, e.to_string()))?;

            self.fd_lru
                .with_file(&path, |file| writeln!(file, "{line}"))
                .map_err(|e| {
                    self.healthy.store(false, Ordering::Relaxed);
                    if e.kind() == std::io::ErrorKind::StorageFull {
                        SinkError::new(ErrorClass::Permanent, "disk full").with_kind(logwarden_model::ErrorKind::DiskFull)
                    } else {
                        SinkError::new(ErrorClass::Temporary, e.to_string())
                    }
                })?;

            accepted += 1;
        }

        self.healthy.store(true, Ordering::Relaxed);
        Ok(SinkOutcome { accepted })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
