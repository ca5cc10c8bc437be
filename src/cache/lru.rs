//! Recency Order
//!
//! Orders cache keys by last use so the entry store knows whom to evict.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Every touch stamps the key with a monotonically increasing tick; the
/// smallest tick is the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Next tick to hand out
    tick: u64,
    /// Key -> tick of its most recent use
    by_key: HashMap<String, u64>,
    /// Tick -> key, ordered oldest first
    by_tick: BTreeMap<u64, String>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unseen.
    pub fn touch(&mut self, key: &str) {
        let tick = self.tick;
        self.tick += 1;

        if let Some(previous) = self.by_key.insert(key.to_string(), tick) {
            self.by_tick.remove(&previous);
        }
        self.by_tick.insert(tick, key.to_string());
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.by_key.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
        self.by_tick.clear();
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
