//! Eviction Order Module
//!
//! Implements First-In-First-Out tracking for capacity eviction.

use std::collections::VecDeque;

// == Eviction Order ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = First inserted (next to evict)
/// - Back = Most recently inserted
///
/// Reads never reorder keys, and re-inserting a tracked key keeps its
/// original position.
#[derive(Debug, Default, Clone)]
pub struct EvictionOrder {
    order: VecDeque<String>,
}

impl EvictionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Track ==
    /// Appends a key to the back unless it is already tracked.
    ///
    /// Returns true if the key was newly added.
    pub fn track(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.order.push_back(key.to_string());
        true
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the earliest inserted key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
