//! API Handlers
//!
//! HTTP request handlers for each image cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, ImageQuery, ImageResponse, MessageResponse, PreloadRequest, PreloadResponse,
};
use crate::service::{CacheService, ServiceStats};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CacheService>,
}

impl AppState {
    pub fn new(service: CacheService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Handler for GET /image
///
/// Returns the stored image, the fallback for known-failed URLs, or loads
/// the image at the requested priority.
pub async fn image_handler(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ImageResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let image = state.service.get_image(&query.url, query.priority).await?;
    Ok(Json(ImageResponse::new(query.url, image)))
}

/// Handler for POST /preload
///
/// Succeeds whenever the request is valid; per-URL failures are reported
/// in the body.
pub async fn preload_handler(
    State(state): State<AppState>,
    Json(req): Json<PreloadRequest>,
) -> Result<Json<PreloadResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let outcomes = state.service.preload_images(req.urls).await;
    Ok(Json(PreloadResponse::new(outcomes)))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.service.clear_cache().await?;
    Ok(Json(MessageResponse::new("Image cache cleared")))
}

/// Handler for DELETE /failed
pub async fn clear_failed_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.service.clear_failed_urls();
    Json(MessageResponse::new("Failed URLs cleared"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(state.service.stats().await)
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.service.is_closed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;
    use crate::fetch::test_support::ScriptedTransport;
    use crate::queue::Priority;

    async fn test_state(transport: Arc<ScriptedTransport>) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            cache_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let service = CacheService::open(config, transport).await.unwrap();
        (dir, AppState::new(service))
    }

    #[tokio::test]
    async fn test_image_handler_loads_and_caches() {
        let transport = Arc::new(ScriptedTransport::ok());
        let (_dir, state) = test_state(transport.clone()).await;
        let query = ImageQuery {
            url: "https://img/1".to_string(),
            priority: Priority::High,
        };

        let response = image_handler(State(state.clone()), Query(query.clone()))
            .await
            .unwrap();
        assert!(!response.fallback);
        assert!(response.image.starts_with("data:image/png"));

        image_handler(State(state), Query(query)).await.unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_image_handler_rejects_blank_url() {
        let (_dir, state) = test_state(Arc::new(ScriptedTransport::ok())).await;
        let query = ImageQuery {
            url: String::new(),
            priority: Priority::Normal,
        };

        let result = image_handler(State(state), Query(query)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_preload_handler_returns_every_url() {
        let (_dir, state) = test_state(Arc::new(ScriptedTransport::ok())).await;
        let req = PreloadRequest {
            urls: vec!["https://img/1".to_string(), "https://img/2".to_string()],
        };

        let response = preload_handler(State(state.clone()), Json(req)).await.unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(state.service.store().len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_handlers() {
        let (_dir, state) = test_state(Arc::new(ScriptedTransport::ok())).await;
        state.service.failures().mark_failed("https://img/x");

        let cleared = clear_cache_handler(State(state.clone())).await.unwrap();
        let response = clear_failed_handler(State(state.clone())).await;

        assert!(cleared.message.contains("cleared"));
        assert!(response.message.contains("cleared"));
        assert!(state.service.failures().is_empty());
    }

    #[tokio::test]
    async fn test_stats_and_health_handlers() {
        let (_dir, state) = test_state(Arc::new(ScriptedTransport::ok())).await;

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.store.hits, 0);
        assert_eq!(stats.max_concurrent, 5);

        let health = health_handler(State(state)).await;
        assert_eq!(health.status, "healthy");
    }
}
