//! Dispatch Workers
//!
//! A fixed pool of tasks draining the scheduled queue into the fetcher.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::fetch::Fetcher;
use crate::queue::ScheduledQueue;

/// Spawns `queue.max_concurrent()` workers.
///
/// Each worker loops: take the most urgent pending request, load it, resolve
/// the caller's handle, repeat. Because every worker runs one load at a
/// time, the number of concurrent loads never exceeds the pool size, and a
/// finished load immediately frees its worker for the next request.
///
/// Workers exit once the queue is closed. In-flight loads are never
/// cancelled; awaiting the returned handles waits for them to finish.
///
/// # Example
/// ```ignore
/// let workers = spawn_dispatch_workers(queue.clone(), fetcher.clone());
/// // Later, during shutdown:
/// queue.close();
/// for worker in workers {
///     worker.await.ok();
/// }
/// ```
pub fn spawn_dispatch_workers(
    queue: Arc<ScheduledQueue>,
    fetcher: Arc<Fetcher>,
) -> Vec<JoinHandle<()>> {
    info!(
        "Starting {} dispatch workers",
        queue.max_concurrent()
    );

    (0..queue.max_concurrent())
        .map(|id| spawn_worker(id, queue.clone(), fetcher.clone()))
        .collect()
}

fn spawn_worker(id: usize, queue: Arc<ScheduledQueue>, fetcher: Arc<Fetcher>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = queue.next_request().await {
            let result = {
                let _active = queue.start_dispatch();
                debug!(
                    "Worker {} dispatching {} ({} priority)",
                    id, request.url, request.priority
                );
                fetcher.load(&request.url).await
            };
            request.complete(result);
        }
        debug!("Dispatch worker {} stopped", id);
    })
}
