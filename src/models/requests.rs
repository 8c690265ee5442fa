//! Request DTOs for the image cache API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::queue::Priority;

/// Largest number of URLs accepted in one preload request
pub const MAX_PRELOAD_BATCH: usize = 1000;

/// Query string for GET /image
///
/// # Fields
/// - `url`: The image URL to load
/// - `priority`: Optional tier (`high`, `normal`, `low`), defaults to normal
#[derive(Debug, Clone, Deserialize)]
pub struct ImageQuery {
    pub url: String,
    #[serde(default)]
    pub priority: Priority,
}

impl ImageQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /preload
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    pub urls: Vec<String>,
}

impl PreloadRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.urls.len() > MAX_PRELOAD_BATCH {
            return Some(format!(
                "Batch exceeds maximum of {} URLs",
                MAX_PRELOAD_BATCH
            ));
        }
        if self.urls.iter().any(|url| url.trim().is_empty()) {
            return Some("URLs cannot be empty".to_string());
        }
        None
    }
}
