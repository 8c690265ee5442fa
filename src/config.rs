//! Configuration Module
//!
//! Handles loading and managing loader configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::DEFAULT_CAPACITY;

/// Placeholder returned whenever an image cannot be obtained.
pub const DEFAULT_FALLBACK_RESOURCE: &str = "/placeholder/200x150?text=Image+Not+Available";

/// Loader configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Network attempts per load before a URL is marked failed
    pub max_retries: u32,
    /// Base backoff delay in milliseconds, doubled after every failed attempt
    pub retry_base_delay_ms: u64,
    /// Maximum number of loads running at the same time
    pub max_concurrent: usize,
    /// Maximum number of images kept in the durable store
    pub cache_capacity: usize,
    /// Reference returned when an image cannot be obtained
    pub fallback_resource: String,
    /// Directory backing the durable store
    pub cache_dir: PathBuf,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_RETRIES` - Attempts per load (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Base backoff delay (default: 1000)
    /// - `MAX_CONCURRENT` - Concurrent loads (default: 5)
    /// - `CACHE_CAPACITY` - Stored images (default: 100)
    /// - `FALLBACK_RESOURCE` - Placeholder reference
    /// - `CACHE_DIR` - Store directory (default: ./image-cache)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: parse_var("MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_base_delay_ms: parse_var("RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.retry_base_delay_ms),
            max_concurrent: parse_var("MAX_CONCURRENT").unwrap_or(defaults.max_concurrent),
            cache_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            fallback_resource: env::var("FALLBACK_RESOURCE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.fallback_resource),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
        .normalized()
    }

    /// Clamps limits that must be at least one.
    pub fn normalized(mut self) -> Self {
        self.max_retries = self.max_retries.max(1);
        self.max_concurrent = self.max_concurrent.max(1);
        self.cache_capacity = self.cache_capacity.max(1);
        self
    }

    /// Returns the base backoff delay as a Duration.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_concurrent: 5,
            cache_capacity: DEFAULT_CAPACITY,
            fallback_resource: DEFAULT_FALLBACK_RESOURCE.to_string(),
            cache_dir: PathBuf::from("./image-cache"),
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.fallback_resource, DEFAULT_FALLBACK_RESOURCE);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MAX_RETRIES");
        env::remove_var("RETRY_BASE_DELAY_MS");
        env::remove_var("MAX_CONCURRENT");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("FALLBACK_RESOURCE");
        env::remove_var("CACHE_DIR");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay(), Duration::from_millis(1000));
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_dir, PathBuf::from("./image-cache"));
    }

    #[test]
    fn test_normalized_clamps_zero_limits() {
        let config = Config {
            max_retries: 0,
            max_concurrent: 0,
            cache_capacity: 0,
            ..Config::default()
        }
        .normalized();

        assert_eq!(config.max_retries, 1);
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.cache_capacity, 1);
    }
}
