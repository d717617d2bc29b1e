use std::time::Duration;

use logwarden_model::DispatchItem;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Accumulates dispatch items into bounded batches, flushing on whichever
/// comes first: `batch_size` items collected, or `batch_timeout` elapsed
/// since the first item in the batch arrived (spec §4.9). A timeout with
/// zero items never flushes an empty batch. Items stay wrapped in
/// `DispatchItem` rather than being unwrapped into `Batch` here, because
/// the fan-out stage needs each one's `retry_count` if the send fails.
pub struct BatchProcessor {
    batch_size: usize,
    batch_timeout: Duration,
}

impl BatchProcessor {
    pub fn new(batch_size: usize, batch_timeout: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_timeout,
        }
    }

    /// Pulls items off `rx` until a full batch is ready or the channel
    /// closes. Returns `None` only when the channel is closed and no items
    /// were collected, signalling the caller to stop.
    pub async fn collect_batch(&self, rx: &mut mpsc::Receiver<DispatchItem>) -> Option<Vec<DispatchItem>> {
        let first = rx.recv().await?;
        let mut items = Vec::with_capacity(self.batch_size);
        items.push(first);

        let deadline = Instant::now() + self.batch_timeout;

        while items.len() < self.batch_size {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::{LogEntry, SourceType};

    fn item() -> DispatchItem {
        DispatchItem::new(LogEntry::new(SourceType::File, "s", "m", Default::default()))
    }

    #[tokio::test]
    async fn flushes_on_size() {
        let processor = BatchProcessor::new(3, Duration::from_secs(10));
        let (tx, mut rx) = mpsc::channel(16);
        for _ in 0..3 {
            tx.send(item()).await.unwrap();
        }

        let batch = processor.collect_batch(&mut rx).await.unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn flushes_on_timeout_with_partial_batch() {
        let processor = BatchProcessor::new(100, Duration::from_millis(20));
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(item()).await.unwrap();

        let batch = processor.collect_batch(&mut rx).await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn closed_empty_channel_yields_none() {
        let processor = BatchProcessor::new(10, Duration::from_millis(10));
        let (tx, mut rx) = mpsc::channel::<DispatchItem>(16);
        drop(tx);

        assert!(processor.collect_batch(&mut rx).await.is_none());
    }
}
