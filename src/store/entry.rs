//! Cache Entry Module
//!
//! Metadata describing one stored image and the on-disk index format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Index record for a single stored image.
///
/// The payload itself lives in `file` inside the store directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source URL, the store key
    pub url: String,
    /// Payload file name relative to the store directory
    pub file: String,
    /// When the payload was last written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file: file.into(),
            stored_at: Utc::now(),
        }
    }
}

/// Builds the payload file name for a sequence number.
pub fn payload_file_name(id: u64) -> String {
    format!("{:016x}.{}", id, PAYLOAD_EXTENSION)
}

/// Extension used by payload files.
pub const PAYLOAD_EXTENSION: &str = "entry";

// == Index File ==
/// Serialized form of `index.json`.
///
/// `entries` is kept in eviction order, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexFile {
    /// Next payload file sequence number
    pub next_file_id: u64,
    /// Stored entries, oldest first
    pub entries: Vec<CacheEntry>,
}
