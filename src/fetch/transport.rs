//! Network transport used by the fetcher.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, redirect, Client};

use crate::error::FetchError;

/// Maximum redirects followed by [`HttpTransport`].
pub const MAX_REDIRECTS: usize = 10;

/// Outcome of one completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to issue a single GET for an image URL.
///
/// Implementations report connection-level failures as
/// [`FetchError::Transport`] and return every completed response, whatever
/// its status; validation is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError>;
}

/// reqwest-backed transport.
///
/// Requests accept any image type, bypass intermediate caches and follow
/// up to [`MAX_REDIRECTS`] redirects.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        tracing::debug!("Fetching image from `{}`", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "image/*")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
