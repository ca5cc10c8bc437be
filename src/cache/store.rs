//! Entry Store Module
//!
//! Bounded key -> entry map with least-recently-used eviction. Expiry is
//! not enforced here: stale entries are still needed for fallbacks.

use std::collections::HashMap;

use crate::cache::{CacheEntry, LruTracker};

// == Entry Store ==
#[derive(Debug)]
pub struct EntryStore {
    /// Key-entry storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Evictions since construction or the last clear
    evictions: u64,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_size,
            evictions: 0,
        }
    }

    // == Get ==
    /// Returns a copy of the entry and marks it as recently used.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?.clone();
        self.lru.touch(key);
        Some(entry)
    }

    // == Set ==
    /// Stores an entry under its key, replacing any previous entry.
    ///
    /// When a new key would exceed capacity, the least recently used entry
    /// is evicted first and its key is returned.
    pub fn set(&mut self, entry: CacheEntry) -> Option<String> {
        let mut evicted = None;

        if !self.entries.contains_key(&entry.key) && self.entries.len() >= self.max_size {
            if let Some(victim) = self.lru.evict_oldest() {
                self.entries.remove(&victim);
                self.evictions += 1;
                evicted = Some(victim);
            }
        }

        self.lru.touch(&entry.key);
        self.entries.insert(entry.key.clone(), entry);
        evicted
    }

    // == Entries For Url ==
    /// Returns every entry whose key was derived from `url`.
    pub fn entries_for_url<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a CacheEntry> + 'a {
        self.entries.values().filter(move |entry| entry.url == url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    // == Clear ==
    /// Removes every entry and resets the eviction counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.evictions = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}
