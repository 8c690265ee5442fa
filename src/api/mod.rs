//! API Module
//!
//! HTTP handlers and routing for the image cache REST API.
//!
//! # Endpoints
//! - `GET /image?url=..&priority=..` - Load an image, cache-first
//! - `POST /preload` - Cache a batch of images at low priority
//! - `DELETE /cache` - Clear stored images
//! - `DELETE /failed` - Forget failed URLs
//! - `GET /stats` - Get loader statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
