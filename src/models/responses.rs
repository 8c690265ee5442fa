//! Response DTOs for the image cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::fetch::ImageRef;
use crate::service::PreloadOutcome;

/// Response body for GET /image
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    /// The requested URL
    pub url: String,
    /// Encoded payload or fallback reference
    pub image: String,
    /// True when `image` is the fallback reference
    pub fallback: bool,
}

impl ImageResponse {
    pub fn new(url: impl Into<String>, image: ImageRef) -> Self {
        Self {
            url: url.into(),
            fallback: image.is_fallback(),
            image: image.into_string(),
        }
    }
}

/// Settled result of one preloaded URL
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PreloadResult {
    Fulfilled {
        url: String,
        image: String,
        fallback: bool,
    },
    Rejected {
        url: String,
        reason: String,
    },
}

impl From<PreloadOutcome> for PreloadResult {
    fn from(outcome: PreloadOutcome) -> Self {
        match outcome.result {
            Ok(image) => PreloadResult::Fulfilled {
                url: outcome.url,
                fallback: image.is_fallback(),
                image: image.into_string(),
            },
            Err(e) => PreloadResult::Rejected {
                url: outcome.url,
                reason: e.to_string(),
            },
        }
    }
}

/// Response body for POST /preload
#[derive(Debug, Clone, Serialize)]
pub struct PreloadResponse {
    pub results: Vec<PreloadResult>,
}

impl PreloadResponse {
    pub fn new(outcomes: Vec<PreloadOutcome>) -> Self {
        Self {
            results: outcomes.into_iter().map(PreloadResult::from).collect(),
        }
    }
}

/// Response body for the reset endpoints (DELETE /cache, DELETE /failed)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy" or "closed")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(closed: bool) -> Self {
        Self {
            status: if closed { "closed" } else { "healthy" }.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
