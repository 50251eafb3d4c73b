//! Cache Statistics Module
//!
//! Tracks eviction store metrics including hits, misses, evictions and bytes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks eviction store metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found the key
    pub hits: u64,
    /// Number of lookups that did not find the key
    pub misses: u64,
    /// Number of entries evicted due to the byte budget
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Current sum of key and value lengths
    pub used_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
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

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Occupancy ==
    /// Updates the entry count and byte usage.
    pub fn set_occupancy(&mut self, entries: usize, used_bytes: usize) {
        self.total_entries = entries;
        self.used_bytes = used_bytes;
    }
}
