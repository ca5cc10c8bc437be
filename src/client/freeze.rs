//! Freeze Overlay
//!
//! Pins the current cached value of a key. A frozen entry shadows the entry
//! store for every read of that key and never expires.

use std::collections::HashMap;

use crate::cache::CacheEntry;

#[derive(Debug, Default)]
pub struct FreezeOverlay {
    frozen: HashMap<String, CacheEntry>,
}

impl FreezeOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `entry` under its key, replacing an earlier pin.
    pub fn freeze(&mut self, entry: CacheEntry) {
        self.frozen.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.frozen.get(key)
    }

    /// Unpins every key derived from `url`. Returns how many were unpinned.
    pub fn unfreeze_url(&mut self, url: &str) -> usize {
        let before = self.frozen.len();
        self.frozen.retain(|_, entry| entry.url != url);
        before - self.frozen.len()
    }

    /// Unpins everything. Returns how many were unpinned.
    pub fn clear(&mut self) -> usize {
        let count = self.frozen.len();
        self.frozen.clear();
        count
    }

    pub fn is_url_frozen(&self, url: &str) -> bool {
        self.frozen.values().any(|entry| entry.url == url)
    }

    pub fn len(&self) -> usize {
        self.frozen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frozen.is_empty()
    }
}
