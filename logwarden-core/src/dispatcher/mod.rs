mod fanout;
mod handle;
#[cfg(test)]
mod tests;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logwarden_config::DispatcherConfig;
use logwarden_contracts::Sink;

use crate::backpressure::{BackpressureMonitor, LoadSignals};
use crate::batch_processor::BatchProcessor;
use crate::circuit_breaker::{BreakerSettings, CircuitBreaker};
use crate::dedup::Deduplicator;
use crate::degradation::DegradationController;
use crate::dlq::DlqStore;
use crate::rate_limiter::RateLimiter;
use crate::retry_manager::RetryManager;
use crate::stats::{DispatcherStats, StatsSnapshot};
use crate::timestamp_learner::TimestampLearner;
use logwarden_model::DispatchItem;

/// Owns the full log-entry delivery pipeline described in spec §4: gate
/// (`handle`), worker pool, per-sink circuit breakers, retry manager, and
/// DLQ. One `Dispatcher` per agent process.
pub struct Dispatcher {
    config: DispatcherConfig,
    stats: Arc<DispatcherStats>,
    rate_limiter: RateLimiter,
    backpressure: BackpressureMonitor,
    degradation: DegradationController,
    dedup: Deduplicator,
    timestamp_learner: TimestampLearner,
    dlq: DlqStore,
    retry_manager: Arc<RetryManager>,
    sinks: Vec<Arc<dyn Sink>>,
    breakers: HashMap<String, CircuitBreaker>,
    ingress_tx: mpsc::Sender<DispatchItem>,
    ingress_rx: Arc<AsyncMutex<mpsc::Receiver<DispatchItem>>>,
    running: AtomicBool,
    shutdown: CancellationToken,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        sinks: Vec<Arc<dyn Sink>>,
        breaker_settings: HashMap<String, BreakerSettings>,
    ) -> anyhow::Result<Arc<Self>> {
        let (ingress_tx, ingress_rx) = mpsc::channel(config.queue_size);

        // The retry manager re-arms items onto the same ingress queue it
        // came from, so a retried entry re-enters the whole gate pipeline
        // (dedup, timestamp checks) rather than skipping straight to fanout.
        let retry_manager = Arc::new(RetryManager::new(
            config.retry_manager.max_capacity,
            ingress_tx.clone(),
        ));

        let breakers = sinks
            .iter()
            .map(|sink| {
                let settings = breaker_settings.get(sink.name()).copied().unwrap_or_default();
                (sink.name().to_string(), CircuitBreaker::from_settings(settings))
            })
            .collect();

        let dlq = DlqStore::open(&config.dlq)?;

        Ok(Arc::new(Self {
            rate_limiter: if config.enable_rate_limit {
                RateLimiter::new(config.rate_limit_per_sec as u64, config.rate_limit_per_sec as u64)
            } else {
                RateLimiter::disabled()
            },
            backpressure: BackpressureMonitor::new(&config),
            degradation: DegradationController::new(config.degradation),
            dedup: Deduplicator::new(config.dedup_cache_size, config.dedup_ttl, config.dedup_time_quantum),
            timestamp_learner: TimestampLearner::new(
                config.timestamp_tolerance,
                Duration::from_secs(60),
                Duration::from_secs(60),
            ),
            dlq,
            retry_manager,
            sinks,
            breakers,
            ingress_tx,
            ingress_rx: Arc::new(AsyncMutex::new(ingress_rx)),
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            worker_handles: Mutex::new(Vec::new()),
            stats: Arc::new(DispatcherStats::new()),
            config,
        }))
    }

    /// Starts every sink, the worker pool, the retry manager's ticker, and
    /// the periodic backpressure sampler. Idempotent only in the sense
    /// that calling it twice spawns a second set of workers — callers are
    /// expected to call it exactly once.
    pub async fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        for sink in &self.sinks {
            sink.start().await?;
        }

        self.running.store(true, Ordering::Release);

        let mut handles = self.worker_handles.lock();
        let batch_processor = Arc::new(BatchProcessor::new(self.config.batch_size, self.config.batch_timeout));

        for _ in 0..self.config.workers.max(1) {
            let dispatcher = Arc::clone(self);
            let rx = Arc::clone(&self.ingress_rx);
            let batch_processor = Arc::clone(&batch_processor);
            let shutdown = self.shutdown.clone();
            handles.push(tokio::spawn(worker::run_worker(dispatcher, rx, batch_processor, shutdown)));
        }

        {
            let retry_manager = Arc::clone(&self.retry_manager);
            let tick = self.config.retry_manager.tick_interval;
            let shutdown = self.shutdown.clone();
            handles.push(tokio::spawn(async move {
                retry_manager.run(tick, shutdown).await;
            }));
        }

        {
            let dispatcher = Arc::clone(self);
            let shutdown = self.shutdown.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.run_backpressure_sampler(shutdown).await;
            }));
        }

        Ok(())
    }

    async fn run_backpressure_sampler(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.config.enable_backpressure {
                        continue;
                    }
                    let depth = self.ingress_tx.max_capacity() - self.ingress_tx.capacity();
                    let queue_utilization = depth as f64 / self.config.queue_size.max(1) as f64;
                    let snap = self.stats.snapshot();
                    let total = snap.total_processed.max(1);
                    let error_rate = snap.error_count as f64 / total as f64;

                    let level = self.backpressure.update(LoadSignals {
                        queue_utilization,
                        memory_utilization: 0.0,
                        error_rate,
                    });

                    if self.config.enable_degradation {
                        self.degradation.apply(level);
                    }
                }
            }
        }
    }

    /// Stops accepting new entries, signals all background tasks to wind
    /// down, and waits (bounded by `deadline`) for workers to finish
    /// in-flight batches before stopping sinks.
    pub async fn stop(&self, deadline: Duration) -> anyhow::Result<()> {
        self.running.store(false, Ordering::Release);
        self.shutdown.cancel();

        let handles: Vec<_> = std::mem::take(&mut *self.worker_handles.lock());
        let _ = tokio::time::timeout(deadline, futures::future::join_all(handles)).await;

        for sink in &self.sinks {
            sink.stop().await?;
        }

        Ok(())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn dlq_len(&self) -> usize {
        self.dlq.len()
    }

    /// Re-attempts delivery for DLQ entries whose original failure might
    /// have been transient (operator-triggered, not automatic).
    pub fn replay_dlq(&self) -> anyhow::Result<(usize, usize)> {
        self.dlq.replay(|dlq_entry| {
            let item = DispatchItem::for_retry(dlq_entry.entry.clone(), 0);
            self.ingress_tx.try_send(item).is_ok()
        })
    }
}
