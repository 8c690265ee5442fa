//! Fetch Module
//!
//! Network loading of images: transport, retry policy, payload decoding and
//! the fetcher tying them together.

mod fetcher;
mod payload;
mod retry;
mod transport;

use serde::Serialize;

pub use fetcher::Fetcher;
pub use payload::{encode_data_url, sniff_image_type};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, TransportResponse, MAX_REDIRECTS};

// == Image Reference ==
/// What a load resolves to: the encoded image or the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// `data:` URL ready for display
    Payload(String),
    /// Static placeholder reference
    Fallback(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Payload(s) | ImageRef::Fallback(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ImageRef::Payload(s) | ImageRef::Fallback(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageRef::Fallback(_))
    }
}
