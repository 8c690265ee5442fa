//! Store Module
//!
//! Durable, capacity-bounded image storage with FIFO eviction.

mod disk;
mod entry;
mod fifo;
mod stats;


// Re-export public types
pub use disk::PersistentStore;
pub use entry::{CacheEntry, IndexFile};
pub use fifo::EvictionOrder;
pub use stats::StoreStats;

// == Public Constants ==
/// Default number of images kept on disk
pub const DEFAULT_CAPACITY: usize = 100;
