//! Scheduled Queue
//!
//! Priority-ordered pending loads waiting for a dispatch worker.
//!
//! Requests are ordered by tier (high before normal before low) and, within
//! a tier, by enqueue order. Workers pull from the queue, so at most as many
//! loads run at once as there are workers.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Notify};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::fetch::ImageRef;

// == Priority ==
/// Urgency tier of a load request. Lower sorts first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl FromStr for Priority {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown priority '{}', expected high, normal or low",
                other
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

// == Pending Request ==
/// A load waiting for dispatch.
#[derive(Debug)]
pub struct PendingRequest {
    pub url: String,
    pub priority: Priority,
    seq: u64,
    reply: oneshot::Sender<ImageRef>,
}

impl PendingRequest {
    /// Resolves the caller's handle. A caller that stopped waiting is ignored.
    pub fn complete(self, result: ImageRef) {
        let _ = self.reply.send(result);
    }
}

// BinaryHeap pops the greatest element, so "greater" means "dispatch sooner".
impl Ord for PendingRequest {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingRequest {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingRequest {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for PendingRequest {}

// == Load Handle ==
/// Resolves with the result of an enqueued load.
///
/// Yields [`CacheError::ServiceClosed`] if the queue was closed before the
/// request was dispatched.
#[derive(Debug)]
pub struct LoadHandle {
    rx: oneshot::Receiver<ImageRef>,
}

impl Future for LoadHandle {
    type Output = Result<ImageRef>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| CacheError::ServiceClosed))
    }
}

// == Dispatch Guard ==
/// Counts one running load for as long as it is alive.
pub struct DispatchGuard<'a> {
    queue: &'a ScheduledQueue,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.queue.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Scheduled Queue ==
#[derive(Debug)]
pub struct ScheduledQueue {
    pending: Mutex<BinaryHeap<PendingRequest>>,
    next_seq: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    max_concurrent: usize,
    closed: AtomicBool,
    notify: Notify,
}

impl ScheduledQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            pending: Mutex::new(BinaryHeap::new()),
            next_seq: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
            max_concurrent: max_concurrent.max(1),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, BinaryHeap<PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Enqueue ==
    /// Queues a load of `url` and returns a handle to its result.
    ///
    /// Never blocks. Identical URLs are not merged; each call is its own load.
    pub fn enqueue(&self, url: impl Into<String>, priority: Priority) -> LoadHandle {
        let (reply, rx) = oneshot::channel();
        let url = url.into();

        let mut pending = self.lock_pending();
        if self.closed.load(Ordering::SeqCst) {
            // Dropping `reply` resolves the handle with ServiceClosed.
            return LoadHandle { rx };
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!("Queued {} at {} priority (#{})", url, priority, seq);
        pending.push(PendingRequest {
            url,
            priority,
            seq,
            reply,
        });
        drop(pending);

        self.notify.notify_one();
        LoadHandle { rx }
    }

    // == Next Request ==
    /// Waits for the most urgent pending request.
    ///
    /// Returns `None` once the queue is closed.
    pub async fn next_request(&self) -> Option<PendingRequest> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut pending = self.lock_pending();
                if self.closed.load(Ordering::SeqCst) {
                    return None;
                }
                if let Some(request) = pending.pop() {
                    return Some(request);
                }
            }

            notified.await;
        }
    }

    /// Marks one load as running until the guard is dropped.
    pub fn start_dispatch(&self) -> DispatchGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        DispatchGuard { queue: self }
    }

    // == Close ==
    /// Stops dispatching. Requests still pending resolve with ServiceClosed.
    pub fn close(&self) {
        let drained = {
            let mut pending = self.lock_pending();
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut *pending)
        };
        if !drained.is_empty() {
            debug!("Dropping {} undispatched requests", drained.len());
        }
        drop(drained);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running loads seen so far.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
