use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_model::DispatchItem;

/// A delayed item waiting for its backoff to elapse.
struct Scheduled {
    ready_at: tokio::time::Instant,
    item: DispatchItem,
}

/// Single bounded ready-queue with one ticker task, replacing a
/// goroutine/task-per-retry design (spec §4.10, §9 redesign note): every
/// sink worker's retries land here instead of spawning their own sleep
/// timer, so the number of in-flight retry tasks is capped regardless of
/// how many entries are being retried.
pub struct RetryManager {
    capacity: usize,
    pending: Mutex<Vec<Scheduled>>,
    len: AtomicUsize,
    ready_tx: mpsc::Sender<DispatchItem>,
}

impl RetryManager {
    /// `ready_tx` is the channel retried items are pushed back onto once
    /// their delay elapses; typically the dispatcher's own ingress queue.
    pub fn new(capacity: usize, ready_tx: mpsc::Sender<DispatchItem>) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: Mutex::new(Vec::new()),
            len: AtomicUsize::new(0),
            ready_tx,
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Schedules `item` to be re-delivered after `delay`. Returns `false`
    /// if the manager is at capacity; the caller should route the item to
    /// the DLQ instead (`ErrorKind::RetryQueueOverflow`).
    pub fn schedule(&self, item: DispatchItem, delay: Duration) -> bool {
        if self.is_full() {
            return false;
        }

        self.pending.lock().push(Scheduled {
            ready_at: tokio::time::Instant::now() + delay,
            item,
        });
        self.len.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Runs until `shutdown` fires, periodically draining due items back
    /// onto `ready_tx`. A single ticker rather than one timer per item
    /// keeps memory and scheduler pressure flat under retry storms.
    pub async fn run(&self, tick_interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(tick_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.drain_due().await,
            }
        }
    }

    async fn drain_due(&self) {
        let now = tokio::time::Instant::now();

        let due_items = {
            let mut pending = self.pending.lock();
            let (due, remaining): (Vec<_>, Vec<_>) =
                std::mem::take(&mut *pending).into_iter().partition(|s| s.ready_at <= now);
            *pending = remaining;
            due
        };

        self.len.fetch_sub(due_items.len().min(self.len()), Ordering::Relaxed);

        for scheduled in due_items {
            if self.ready_tx.send(scheduled.item).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::{LogEntry, SourceType};

    fn item() -> DispatchItem {
        DispatchItem::new(LogEntry::new(SourceType::File, "s", "m", Default::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn schedules_and_redelivers_after_delay() {
        let (tx, mut rx) = mpsc::channel(16);
        let manager = RetryManager::new(10, tx);
        let shutdown = CancellationToken::new();

        assert!(manager.schedule(item(), Duration::from_millis(50)));
        assert_eq!(manager.len(), 1);

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                manager.run(Duration::from_millis(10), shutdown).await;
            })
        };

        tokio::time::advance(Duration::from_millis(100)).await;
        let redelivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert!(redelivered.is_some());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn rejects_when_full() {
        let (tx, _rx) = mpsc::channel(16);
        let manager = RetryManager::new(1, tx);
        assert!(manager.schedule(item(), Duration::from_secs(1)));
        assert!(!manager.schedule(item(), Duration::from_secs(1)));
    }
}
