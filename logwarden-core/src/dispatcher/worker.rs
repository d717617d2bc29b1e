use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_model::DispatchItem;

use crate::batch_processor::BatchProcessor;

use super::Dispatcher;

/// One worker among `dispatcher.workers`, all pulling from the same
/// ingress receiver behind a mutex. A true MPMC channel would avoid the
/// lock, but `tokio::sync::mpsc` is single-consumer; sharing one receiver
/// this way is the standard workaround and the mutex is only ever held for
/// the duration of one `recv`/timeout race, not for the batch's lifetime.
pub(super) async fn run_worker(
    dispatcher: Arc<Dispatcher>,
    rx: Arc<AsyncMutex<mpsc::Receiver<DispatchItem>>>,
    batch_processor: Arc<BatchProcessor>,
    shutdown: CancellationToken,
) {
    loop {
        let batch = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                batch = batch_processor.collect_batch(&mut rx) => batch,
            }
        };

        match batch {
            Some(items) if !items.is_empty() => {
                let depth = dispatcher.ingress_tx.max_capacity() - dispatcher.ingress_tx.capacity();
                dispatcher.stats.set_queue_depth(depth);
                dispatcher.fanout(items).await;
            }
            _ => {
                if shutdown.is_cancelled() {
                    break;
                }
            }
        }
    }
}
