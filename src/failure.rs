//! Failure Tracker
//!
//! Remembers URLs that exhausted their retries so they are not requested
//! again until an explicit reset.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

/// Shared set of permanently failed URLs.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct FailureTracker {
    failed: Arc<RwLock<HashSet<String>>>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.failed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Records `url` as failed. Marking twice is a no-op.
    pub fn mark_failed(&self, url: &str) {
        let mut failed = self.failed.write().unwrap_or_else(PoisonError::into_inner);
        if failed.insert(url.to_string()) {
            info!("Marked {} as failed", url);
        }
    }

    /// Forgets every failed URL at once.
    pub fn reset(&self) {
        let mut failed = self.failed.write().unwrap_or_else(PoisonError::into_inner);
        let cleared = failed.len();
        failed.clear();
        info!("Cleared {} failed URLs", cleared);
    }

    pub fn len(&self) -> usize {
        self.failed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
