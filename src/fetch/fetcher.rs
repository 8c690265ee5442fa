//! Fetcher
//!
//! Performs one logical load of an image URL: network attempts with
//! exponential backoff, validation, decode and persistence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::failure::FailureTracker;
use crate::fetch::{payload, ImageRef, RetryPolicy, Transport};
use crate::store::PersistentStore;

/// Loads images through a [`Transport`] and writes successes to the store.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    store: Arc<PersistentStore>,
    failures: FailureTracker,
    policy: RetryPolicy,
    fallback: String,
    network_requests: AtomicU64,
    fallbacks_served: AtomicU64,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<PersistentStore>,
        failures: FailureTracker,
        policy: RetryPolicy,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            failures,
            policy,
            fallback: fallback.into(),
            network_requests: AtomicU64::new(0),
            fallbacks_served: AtomicU64::new(0),
        }
    }

    // == Load ==
    /// Loads `url`, always producing something displayable.
    ///
    /// Transport and validation failures are retried with backoff; when the
    /// last attempt fails the URL is marked failed and the fallback is
    /// returned. An undecodable body returns the fallback straight away.
    pub async fn load(&self, url: &str) -> ImageRef {
        // A duplicate request may have been queued before the URL failed.
        if self.failures.is_failed(url) {
            debug!("Skipping {}, already marked failed", url);
            return self.fallback();
        }

        let mut attempt = 0;
        loop {
            match self.attempt(url).await {
                Ok(payload) => {
                    self.persist(url, &payload).await;
                    return ImageRef::Payload(payload);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("Image {} could not be decoded: {}", url, e);
                    return self.fallback();
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt + 1,
                        self.policy.max_attempts,
                        url,
                        e
                    );
                    if self.policy.is_last(attempt) {
                        error!("All attempts for {} failed, serving fallback", url);
                        self.failures.mark_failed(url);
                        return self.fallback();
                    }
                    tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        self.network_requests.fetch_add(1, Ordering::Relaxed);
        let response = self.transport.get(url).await?;

        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        if response.body.is_empty() {
            return Err(FetchError::EmptyPayload);
        }

        payload::encode_data_url(response.content_type.as_deref(), &response.body)
    }

    async fn persist(&self, url: &str, payload: &str) {
        // The fetch itself succeeded, so a failed write only costs the cache entry.
        if let Err(e) = self.store.put(url, payload).await {
            warn!("Serving {} without caching it: {}", url, e);
        }
    }

    /// Returns the fallback reference and counts it.
    pub fn fallback(&self) -> ImageRef {
        self.fallbacks_served.fetch_add(1, Ordering::Relaxed);
        ImageRef::Fallback(self.fallback.clone())
    }

    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }

    pub fn store(&self) -> &Arc<PersistentStore> {
        &self.store
    }

    /// Network requests issued so far, retries included.
    pub fn network_requests(&self) -> u64 {
        self.network_requests.load(Ordering::Relaxed)
    }

    pub fn fallbacks_served(&self) -> u64 {
        self.fallbacks_served.load(Ordering::Relaxed)
    }
}
