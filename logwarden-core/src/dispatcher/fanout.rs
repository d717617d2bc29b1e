use std::time::Duration;

use logwarden_contracts::Sink;
use logwarden_model::{Batch, DispatchItem, ErrorKind};
use rand::Rng;

use super::Dispatcher;

impl Dispatcher {
    /// Fans a batch of items out to every configured sink independently.
    /// Each sink's circuit breaker, health, success, and failure are
    /// entirely its own: sink B failing never blocks or retries against
    /// sink A. Delivery is therefore at-least-once per sink, not
    /// exactly-once across all of them — a retried item may re-land on a
    /// sink that already accepted it the first time.
    pub(super) async fn fanout(&self, items: Vec<DispatchItem>) {
        if items.is_empty() {
            return;
        }

        let batch: Batch = items.iter().map(|d| d.entry.clone()).collect();

        for sink in &self.sinks {
            let breaker = self.breakers.get(sink.name());

            let allowed = breaker.map(|b| b.allow_request()).unwrap_or(true);
            if !allowed {
                self.route_to_dlq(&items, sink.name(), "circuit breaker open", ErrorKind::Server)
                    .await;
                continue;
            }

            let outcome = tokio::time::timeout(self.config.send_deadline, sink.send(&batch)).await;

            match outcome {
                Ok(Ok(result)) => {
                    if let Some(b) = breaker {
                        b.record_success();
                    }
                    self.stats.record_sink_sent(sink.name(), result.accepted as u64);
                }
                Ok(Err(sink_error)) => {
                    let kind = sink_error.error_kind();
                    if let Some(b) = breaker {
                        b.record_failure(kind.counts_as_circuit_fault());
                    }
                    self.stats.record_sink_failed(sink.name(), batch.len() as u64);
                    self.handle_send_failure(&items, sink.name(), kind, &sink_error.to_string())
                        .await;
                }
                Err(_timeout) => {
                    if let Some(b) = breaker {
                        b.record_failure(true);
                    }
                    self.stats.record_sink_failed(sink.name(), batch.len() as u64);
                    self.handle_send_failure(&items, sink.name(), ErrorKind::Temporary, "send deadline exceeded")
                        .await;
                }
            }
        }
    }

    async fn handle_send_failure(
        &self,
        items: &[DispatchItem],
        sink_name: &str,
        kind: ErrorKind,
        message: &str,
    ) {
        if !kind.is_retryable() {
            self.route_to_dlq(items, sink_name, message, kind).await;
            return;
        }

        for item in items {
            if item.retry_count >= self.config.max_retries {
                self.route_one_to_dlq(item, sink_name, message, ErrorKind::MaxRetriesExceeded)
                    .await;
                continue;
            }

            let retry_item = DispatchItem::for_retry(item.entry.clone(), item.retry_count + 1);
            let delay = self.backoff_delay(retry_item.retry_count);
            self.stats.record_retry();

            if !self.retry_manager.schedule(retry_item.clone(), delay) {
                self.route_one_to_dlq(&retry_item, sink_name, "retry queue overflow", ErrorKind::RetryQueueOverflow)
                    .await;
            }
        }
    }

    fn backoff_delay(&self, retry_count: u32) -> Duration {
        let base = self.config.retry_base_delay.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << retry_count.min(16));
        let capped = exp.min(self.config.retry_max_delay.as_millis() as u64).max(1);
        let jitter = rand::rng().random_range(0..=capped / 4 + 1);
        Duration::from_millis(capped + jitter)
    }

    async fn route_to_dlq(&self, items: &[DispatchItem], sink_name: &str, message: &str, kind: ErrorKind) {
        for item in items {
            self.route_one_to_dlq(item, sink_name, message, kind).await;
        }
    }

    async fn route_one_to_dlq(&self, item: &DispatchItem, sink_name: &str, message: &str, kind: ErrorKind) {
        let dlq_entry = logwarden_model::DlqEntry::new(
            item.entry.clone(),
            message,
            kind,
            sink_name,
            item.retry_count,
            self.worker_id_label(),
        );
        self.stats.record_dlq();
        if let Err(err) = self.dlq.append(&dlq_entry) {
            tracing::error!(error = %err, sink = sink_name, "failed to persist entry to dead-letter queue");
        }
    }

    fn worker_id_label(&self) -> String {
        "dispatcher".to_string()
    }
}
