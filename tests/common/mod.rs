//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image_cache::{CacheService, Config, FetchError, Transport, TransportResponse};
use tokio::time::Instant;

pub const FALLBACK: &str = "/placeholder/test.png";

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Serves a small JPEG for every URL except those listed as broken, which
/// answer 503.
#[derive(Default)]
pub struct FakeImageHost {
    broken: Mutex<HashSet<String>>,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl FakeImageHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn break_url(&self, url: &str) {
        self.broken.lock().unwrap().insert(url.to_string());
    }

    pub fn repair_url(&self, url: &str) {
        self.broken.lock().unwrap().remove(url);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests_at(url).len()
    }

    pub fn requests_at(&self, url: &str) -> Vec<Instant> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl Transport for FakeImageHost {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        if self.broken.lock().unwrap().contains(url) {
            return Ok(TransportResponse::new(503, Some("text/plain"), "unavailable"));
        }
        Ok(TransportResponse::new(200, Some("image/jpeg"), JPEG_BYTES))
    }
}

pub fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        cache_dir: dir.path().join("images"),
        fallback_resource: FALLBACK.to_string(),
        ..Config::default()
    }
}

pub async fn open_service(host: Arc<FakeImageHost>) -> (tempfile::TempDir, CacheService) {
    let dir = tempfile::tempdir().unwrap();
    let service = CacheService::open(test_config(&dir), host).await.unwrap();
    (dir, service)
}
