//! Store Statistics Module
//!
//! Tracks durable store activity: lookups, writes and capacity evictions.

use serde::Serialize;

// == Store Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Lookups that found a stored payload
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Payloads written (new or overwritten)
    pub writes: u64,
    /// Entries removed to make room for a new key
    pub evictions: u64,
    /// Current number of stored entries
    pub total_entries: usize,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StoreStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = StoreStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_writes_and_evictions_are_independent() {
        let mut stats = StoreStats::new();
        stats.record_write();
        stats.record_write();
        stats.record_eviction();
        stats.set_total_entries(1);

        assert_eq!(stats.writes, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = StoreStats::new();
        stats.record_miss();

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"misses\":1"));
        assert!(json.contains("total_entries"));
    }
}
