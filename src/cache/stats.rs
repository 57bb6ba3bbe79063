//! Cache Statistics Module
//!
//! Tracks lookups, evictions, expirations and rejected insertions.

use serde::Serialize;

// == Cache Stats ==
/// Counters and gauges describing cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that found the key
    pub hits: u64,
    /// Lookups that did not find the key
    pub misses: u64,
    /// Entries removed to make room for an insertion
    pub evictions: u64,
    /// Entries removed by the reaper
    pub expirations: u64,
    /// Insertions refused because the item exceeded the budget
    pub rejections: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Current resident payload bytes
    pub current_size: u64,
    /// Configured byte budget
    pub max_size: u64,
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

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }
}
