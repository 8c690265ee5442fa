//! Cache Service
//!
//! Public entry point composing the store, the failure tracker, the queue
//! and the fetcher: cache-first reads, enqueue on miss, batch preload and
//! resets.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::failure::FailureTracker;
use crate::fetch::{Fetcher, ImageRef, RetryPolicy, Transport};
use crate::queue::{Priority, ScheduledQueue};
use crate::store::{PersistentStore, StoreStats};
use crate::tasks::spawn_dispatch_workers;

// == Preload Outcome ==
/// Settled result of one URL in a preload batch.
#[derive(Debug)]
pub struct PreloadOutcome {
    pub url: String,
    pub result: Result<ImageRef>,
}

impl PreloadOutcome {
    pub fn is_fulfilled(&self) -> bool {
        self.result.is_ok()
    }
}

// == Service Stats ==
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub store: StoreStats,
    pub hit_rate: f64,
    pub failed_urls: usize,
    pub network_requests: u64,
    pub fallbacks_served: u64,
    pub pending: usize,
    pub active: usize,
    pub peak_active: usize,
    pub max_concurrent: usize,
}

// == Cache Service ==
/// An independently owned image loader instance.
///
/// Each instance has its own store directory, failure set, queue and worker
/// pool. Call [`CacheService::close`] to stop the workers; dropping the
/// service closes the queue as well.
pub struct CacheService {
    config: Config,
    store: Arc<PersistentStore>,
    failures: FailureTracker,
    fetcher: Arc<Fetcher>,
    queue: Arc<ScheduledQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheService {
    // == Open ==
    /// Opens the durable store and starts the dispatch workers.
    ///
    /// Fails with [`CacheError::StoreInitialization`] if the store cannot be
    /// opened.
    pub async fn open(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = config.normalized();
        let store = Arc::new(PersistentStore::open(&config.cache_dir, config.cache_capacity).await?);
        let failures = FailureTracker::new();
        let fetcher = Arc::new(Fetcher::new(
            transport,
            store.clone(),
            failures.clone(),
            RetryPolicy::from_config(&config),
            config.fallback_resource.clone(),
        ));
        let queue = Arc::new(ScheduledQueue::new(config.max_concurrent));
        let workers = spawn_dispatch_workers(queue.clone(), fetcher.clone());

        info!(
            "Image cache service ready: capacity={}, max_concurrent={}, max_retries={}",
            config.cache_capacity, config.max_concurrent, config.max_retries
        );

        Ok(Self {
            config,
            store,
            failures,
            fetcher,
            queue,
            workers: Mutex::new(workers),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.queue.is_closed() {
            return Err(CacheError::ServiceClosed);
        }
        Ok(())
    }

    // == Get Image ==
    /// Returns the image for `url`.
    ///
    /// Served from the store when present, as the fallback when the URL is
    /// known to have failed, and otherwise loaded through the queue at
    /// `priority`.
    pub async fn get_image(&self, url: &str, priority: Priority) -> Result<ImageRef> {
        self.ensure_open()?;

        match self.store.get(url).await {
            Ok(Some(payload)) => {
                debug!("Cache hit for {}", url);
                return Ok(ImageRef::Payload(payload));
            }
            Ok(None) => {}
            Err(e) => warn!("Cache read for {} failed, loading instead: {}", url, e),
        }

        if self.failures.is_failed(url) {
            debug!("{} is marked failed, serving fallback", url);
            return Ok(self.fetcher.fallback());
        }

        self.queue.enqueue(url, priority).await
    }

    // == Cache Image ==
    /// Fetches and stores `url` without consulting the store first.
    pub async fn cache_image(&self, url: &str, priority: Priority) -> Result<ImageRef> {
        self.ensure_open()?;

        if self.failures.is_failed(url) {
            return Ok(self.fetcher.fallback());
        }
        self.queue.enqueue(url, priority).await
    }

    // == Preload Images ==
    /// Caches every URL at low priority, concurrently.
    ///
    /// Always returns one settled outcome per URL, in input order; a failing
    /// URL never fails the batch.
    pub async fn preload_images<I, S>(&self, urls: I) -> Vec<PreloadOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let loads = urls.into_iter().map(|url| {
            let url: String = url.into();
            async move {
                let result = self.cache_image(&url, Priority::Low).await;
                PreloadOutcome { url, result }
            }
        });
        let outcomes = join_all(loads).await;

        let fulfilled = outcomes.iter().filter(|o| o.is_fulfilled()).count();
        info!("Preloaded {}/{} images", fulfilled, outcomes.len());
        outcomes
    }

    // == Clear Cache ==
    /// Removes every stored image and its eviction tracking.
    pub async fn clear_cache(&self) -> Result<()> {
        self.ensure_open()?;
        self.store.clear().await
    }

    // == Clear Failed URLs ==
    /// Forgets all failed URLs so they are attempted again.
    pub fn clear_failed_urls(&self) {
        self.failures.reset();
    }

    // == Stats ==
    pub async fn stats(&self) -> ServiceStats {
        let store = self.store.stats().await;
        ServiceStats {
            hit_rate: store.hit_rate(),
            store,
            failed_urls: self.failures.len(),
            network_requests: self.fetcher.network_requests(),
            fallbacks_served: self.fetcher.fallbacks_served(),
            pending: self.queue.pending_len(),
            active: self.queue.active(),
            peak_active: self.queue.peak_active(),
            max_concurrent: self.queue.max_concurrent(),
        }
    }

    // == Close ==
    /// Stops accepting work and waits for in-flight loads to finish.
    ///
    /// Requests that were still queued resolve with
    /// [`CacheError::ServiceClosed`].
    pub async fn close(&self) {
        self.queue.close();

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Dispatch worker ended abnormally: {}", e);
            }
        }
        info!("Image cache service closed");
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }
}

impl Drop for CacheService {
    fn drop(&mut self) {
        self.queue.close();
    }
}
