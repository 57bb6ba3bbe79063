//! Age Index Module
//!
//! Orders resident keys by insertion time for eviction and expiry sweeps.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

// == Age Index ==
/// Tracks keys ordered by `(created_at, key)`.
///
/// The first element is the eviction candidate: the oldest insertion, with
/// ties broken by the lexicographically smallest key. Reads never reorder it.
#[derive(Debug, Default, Clone)]
pub struct AgeIndex {
    order: BTreeSet<(DateTime<Utc>, String)>,
}

impl AgeIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            order: BTreeSet::new(),
        }
    }

    // == Insert ==
    /// Records `key` as inserted at `created_at`.
    pub fn insert(&mut self, key: &str, created_at: DateTime<Utc>) {
        self.order.insert((created_at, key.to_string()));
    }

    // == Remove ==
    /// Forgets `key`; `created_at` must be the time it was inserted with.
    pub fn remove(&mut self, key: &str, created_at: DateTime<Utc>) {
        self.order.remove(&(created_at, key.to_string()));
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key.
    ///
    /// Returns None if the index is empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first().map(|(_, key)| key.as_str())
    }

    // == Drain While ==
    /// Removes and returns keys from the oldest end while `expired` holds.
    ///
    /// Stops at the first key for which `expired` returns false, so the
    /// predicate must be monotonic in insertion age.
    pub fn drain_while(&mut self, mut expired: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut drained = Vec::new();
        while let Some((_, key)) = self.order.first() {
            if !expired(key) {
                break;
            }
            if let Some((_, key)) = self.order.pop_first() {
                drained.push(key);
            }
        }
        drained
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
