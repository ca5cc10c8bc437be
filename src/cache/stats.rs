//! Cache Statistics Module
//!
//! Hit/miss counters and the lazily computed stats snapshot.

use serde::Serialize;

// == Stats Counters ==
/// Running hit/miss counters owned by a client.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsCounters {
    hits: u64,
    misses: u64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a read that went to the network.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Builds the public stats view from the counters and the store's state.
    pub fn snapshot(&self, size: usize, evictions: u64) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            ratio: hit_ratio(self.hits, self.misses),
            size,
            evictions,
        }
    }
}

// == Cache Stats ==
/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads served without a network call
    pub hits: u64,
    /// Reads that went to the network
    pub misses: u64,
    /// hits / (hits + misses), 0.0 before any read
    pub ratio: f64,
    /// Entries currently held by the entry store
    pub size: usize,
    /// Entries evicted by the LRU policy since the last clear
    pub evictions: u64,
}

fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_no_requests() {
        let stats = StatsCounters::new().snapshot(0, 0);
        assert_eq!(stats.ratio, 0.0);
    }

    #[test]
    fn test_ratio_mixed() {
        let mut counters = StatsCounters::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();

        let stats = counters.snapshot(2, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert!((stats.ratio - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.size, 2);
    }

    #[test]
    fn test_reset() {
        let mut counters = StatsCounters::new();
        counters.record_hit();
        counters.reset();

        assert_eq!(counters.snapshot(0, 0).hits, 0);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(StatsCounters::new().snapshot(3, 1)).unwrap();
        assert_eq!(json["size"], 3);
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["ratio"], 0.0);
    }
}
