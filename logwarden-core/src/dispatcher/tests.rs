use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use logwarden_config::DispatcherConfig;
use logwarden_contracts::{Sink, SinkError, SinkOutcome};
use logwarden_model::{Batch, Labels, SourceType};

use crate::backpressure::LoadSignals;
use crate::circuit_breaker::BreakerSettings;
use crate::error::DispatchError;

use super::Dispatcher;

struct CountingSink {
    accepted: AtomicUsize,
}

#[async_trait]
impl Sink for CountingSink {
    fn name(&self) -> &str {
        "counting"
    }

    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send(&self, batch: &Batch) -> Result<SinkOutcome, SinkError> {
        self.accepted.fetch_add(batch.len(), Ordering::Relaxed);
        Ok(SinkOutcome { accepted: batch.len() })
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

fn dispatcher_with_tmp_dlq(tmp: &tempfile::TempDir) -> Arc<Dispatcher> {
    let mut config = DispatcherConfig::default();
    config.dlq.directory = tmp.path().to_path_buf();
    config.enable_backpressure = true;

    let sink: Arc<dyn Sink> = Arc::new(CountingSink { accepted: AtomicUsize::new(0) });
    Dispatcher::new(config, vec![sink], HashMap::<String, BreakerSettings>::new()).unwrap()
}

fn force_level(dispatcher: &Dispatcher, queue_utilization: f64) {
    dispatcher.backpressure.update(LoadSignals {
        queue_utilization,
        memory_utilization: 0.0,
        error_rate: 0.0,
    });
}

#[tokio::test]
async fn emergency_backpressure_rejects_without_enqueueing() {
    let tmp = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher_with_tmp_dlq(&tmp);
    dispatcher.running.store(true, Ordering::Release);
    force_level(&dispatcher, 0.99);

    let result = dispatcher.handle(SourceType::File, "src-1", "hello", Labels::new());
    assert_eq!(result, Err(DispatchError::QueueFull));
    assert_eq!(dispatcher.dlq_len(), 0);
}

#[tokio::test]
async fn critical_backpressure_always_sheds_to_dlq_at_full_throttle() {
    let tmp = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher_with_tmp_dlq(&tmp);
    dispatcher.running.store(true, Ordering::Release);
    // Critical throttle_factor is fixed (0.4), so shed_probability (0.6) is
    // deterministic enough that repeated attempts will hit the shed path.
    force_level(&dispatcher, 0.92);

    let mut shed = false;
    for _ in 0..200 {
        let result = dispatcher.handle(SourceType::File, "src-1", "hello", Labels::new());
        if result.is_ok() && dispatcher.dlq_len() > 0 {
            shed = true;
            break;
        }
    }
    assert!(shed, "expected at least one entry to be shed to the DLQ under critical backpressure");
}

#[tokio::test]
async fn normal_backpressure_never_sheds() {
    let tmp = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher_with_tmp_dlq(&tmp);
    dispatcher.running.store(true, Ordering::Release);
    force_level(&dispatcher, 0.0);

    for _ in 0..50 {
        dispatcher.handle(SourceType::File, "src-1", "hello", Labels::new()).unwrap();
    }
    assert_eq!(dispatcher.dlq_len(), 0);
}
