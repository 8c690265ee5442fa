//! Persistent Store Module
//!
//! Durable image storage on the local filesystem with FIFO capacity eviction.
//!
//! Layout of the store directory:
//! - `index.json` - entries in eviction order plus the next file id
//! - `<id>.entry` - one payload per stored URL

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::store::entry::{payload_file_name, IndexFile, PAYLOAD_EXTENSION};
use crate::store::{CacheEntry, EvictionOrder, StoreStats};

const INDEX_FILE: &str = "index.json";

// == Persistent Store ==
/// Durable URL -> payload store holding at most `capacity` entries.
///
/// All state lives behind one async mutex, so an eviction, the payload write
/// and the index update for a `put` happen as a single step.
#[derive(Debug)]
pub struct PersistentStore {
    dir: PathBuf,
    capacity: usize,
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<String, CacheEntry>,
    order: EvictionOrder,
    next_file_id: u64,
    stats: StoreStats,
}

impl StoreState {
    fn forget(&mut self, url: &str) -> Option<CacheEntry> {
        self.order.remove(url);
        let removed = self.entries.remove(url);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    fn to_index(&self) -> IndexFile {
        IndexFile {
            next_file_id: self.next_file_id,
            entries: self
                .order
                .iter()
                .filter_map(|url| self.entries.get(url).cloned())
                .collect(),
        }
    }
}

impl PersistentStore {
    // == Open ==
    /// Opens (or creates) a store rooted at `dir`.
    ///
    /// Index records whose payload file is gone are dropped, and if the
    /// index holds more entries than `capacity` the oldest are evicted.
    pub async fn open(dir: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let dir = dir.into();
        let capacity = capacity.max(1);
        let init_err = |e: io::Error| {
            CacheError::StoreInitialization(format!("{}: {}", dir.display(), e))
        };

        fs::create_dir_all(&dir).await.map_err(init_err)?;
        let index = read_index(&dir).await.map_err(init_err)?;

        let mut state = StoreState {
            next_file_id: index.next_file_id,
            ..StoreState::default()
        };
        for entry in index.entries {
            if state.entries.contains_key(&entry.url) {
                continue;
            }
            if fs::try_exists(dir.join(&entry.file))
                .await
                .map_err(init_err)?
            {
                state.order.track(&entry.url);
                state.entries.insert(entry.url.clone(), entry);
            } else {
                debug!("Dropping index record for {} with missing payload", entry.url);
            }
        }

        while state.entries.len() > capacity {
            let Some(oldest) = state.order.evict_oldest() else {
                break;
            };
            if let Some(evicted) = state.entries.remove(&oldest) {
                remove_payload(&dir, &evicted.file).await;
            }
        }
        state.stats.set_total_entries(state.entries.len());

        // Rewriting the index up front proves the directory is writable.
        write_index(&dir, &state.to_index())
            .await
            .map_err(init_err)?;

        info!(
            "Image store opened at {} with {} of {} entries",
            dir.display(),
            state.entries.len(),
            capacity
        );

        Ok(Self {
            dir,
            capacity,
            state: Mutex::new(state),
        })
    }

    // == Get ==
    /// Returns the stored payload for `url`, if any.
    ///
    /// Reading never changes eviction order.
    pub async fn get(&self, url: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.entries.get(url).cloned() else {
            state.stats.record_miss();
            return Ok(None);
        };

        match fs::read_to_string(self.dir.join(&entry.file)).await {
            Ok(payload) => {
                state.stats.record_hit();
                Ok(Some(payload))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Payload file for {} vanished, dropping entry", url);
                state.forget(url);
                state.stats.record_miss();
                if let Err(e) = write_index(&self.dir, &state.to_index()).await {
                    warn!("Failed to rewrite store index: {}", e);
                }
                Ok(None)
            }
            Err(e) => Err(CacheError::Storage(format!("reading {}: {}", url, e))),
        }
    }

    // == Put ==
    /// Stores `payload` under `url`.
    ///
    /// A new key arriving at capacity evicts the earliest inserted key first.
    /// Overwriting an existing key keeps its eviction position.
    pub async fn put(&self, url: &str, payload: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        let (file, is_new) = match state.entries.get(url) {
            Some(existing) => (existing.file.clone(), false),
            None => (payload_file_name(state.next_file_id), true),
        };

        // Nothing is evicted until the new payload is safely on disk.
        write_atomic(&self.dir.join(&file), payload.as_bytes())
            .await
            .map_err(|e| CacheError::StoreWrite(format!("{}: {}", url, e)))?;

        if is_new {
            state.next_file_id += 1;
            if state.entries.len() >= self.capacity {
                self.evict_oldest(&mut state).await;
            }
        }

        state.order.track(url);
        state
            .entries
            .insert(url.to_string(), CacheEntry::new(url, file));
        state.stats.record_write();
        let total = state.entries.len();
        state.stats.set_total_entries(total);

        write_index(&self.dir, &state.to_index())
            .await
            .map_err(|e| CacheError::StoreWrite(format!("index: {}", e)))
    }

    async fn evict_oldest(&self, state: &mut StoreState) {
        let Some(oldest) = state.order.evict_oldest() else {
            return;
        };
        if let Some(evicted) = state.entries.remove(&oldest) {
            remove_payload(&self.dir, &evicted.file).await;
            state.stats.record_eviction();
            debug!("Evicted {} to stay within capacity {}", oldest, self.capacity);
        }
    }

    // == Delete ==
    /// Removes `url` from the store. Returns true if it was present.
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.forget(url) else {
            return Ok(false);
        };

        remove_payload(&self.dir, &entry.file).await;
        write_index(&self.dir, &state.to_index())
            .await
            .map_err(|e| CacheError::Storage(format!("index: {}", e)))?;
        Ok(true)
    }

    // == Clear ==
    /// Removes every entry and resets eviction tracking.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let storage_err = |e: io::Error| CacheError::Storage(format!("clearing store: {}", e));

        let mut dir = fs::read_dir(&self.dir).await.map_err(storage_err)?;
        while let Some(item) = dir.next_entry().await.map_err(storage_err)? {
            let path = item.path();
            let is_payload = path
                .extension()
                .is_some_and(|ext| ext == PAYLOAD_EXTENSION || ext == "tmp");
            if is_payload {
                fs::remove_file(&path).await.map_err(storage_err)?;
            }
        }

        state.entries.clear();
        state.order.clear();
        state.stats.set_total_entries(0);
        write_index(&self.dir, &state.to_index())
            .await
            .map_err(storage_err)?;

        info!("Image store cleared");
        Ok(())
    }

    // == Introspection ==
    pub async fn contains(&self, url: &str) -> bool {
        self.state.lock().await.entries.contains_key(url)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stored URLs from oldest to newest.
    pub async fn keys(&self) -> Vec<String> {
        self.state.lock().await.order.iter().cloned().collect()
    }

    pub async fn stats(&self) -> StoreStats {
        self.state.lock().await.stats.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// == Filesystem Helpers ==

async fn read_index(dir: &Path) -> io::Result<IndexFile> {
    let bytes = match fs::read(dir.join(INDEX_FILE)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexFile::default()),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice(&bytes) {
        Ok(index) => Ok(index),
        Err(e) => {
            warn!("Store index is unreadable ({}), starting empty", e);
            remove_orphans(dir).await?;
            Ok(IndexFile::default())
        }
    }
}

async fn remove_orphans(dir: &Path) -> io::Result<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(item) = entries.next_entry().await? {
        let path = item.path();
        if path.extension().is_some_and(|ext| ext == PAYLOAD_EXTENSION) {
            fs::remove_file(&path).await?;
        }
    }
    Ok(())
}

async fn write_index(dir: &Path, index: &IndexFile) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(index)?;
    write_atomic(&dir.join(INDEX_FILE), &bytes).await
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await
}

async fn remove_payload(dir: &Path, file: &str) {
    if let Err(e) = fs::remove_file(dir.join(file)).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove payload {}: {}", file, e);
        }
    }
}
