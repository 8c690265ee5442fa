//! Image Cache - A client-side image loader
//!
//! Fetches remote images with bounded concurrency, priority ordering and
//! retry with exponential backoff, keeps them in a durable FIFO cache and
//! remembers URLs that keep failing.

pub mod api;
pub mod config;
pub mod error;
pub mod failure;
pub mod fetch;
pub mod models;
pub mod queue;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, FetchError};
pub use fetch::{HttpTransport, ImageRef, Transport, TransportResponse};
pub use queue::Priority;
pub use service::{CacheService, PreloadOutcome};
