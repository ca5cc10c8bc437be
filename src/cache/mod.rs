//! Cache Module
//!
//! Keyed entry storage with LRU eviction, key derivation and hit statistics.

mod entry;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{base_url, derive_key, display_url, KEYED_HEADERS};
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsCounters};
pub use store::EntryStore;
