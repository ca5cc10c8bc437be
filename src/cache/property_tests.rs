//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, eviction order and key derivation.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;

use crate::cache::{derive_key, CacheEntry, EntryStore};
use crate::models::HttpResponse;

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,16}"
}

fn entry(key: &str) -> CacheEntry {
    CacheEntry::new(key, key, HttpResponse::ok(json!(key)), Utc::now())
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String },
    Get { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        key_strategy().prop_map(|key| StoreOp::Set { key }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The store never holds more than max_size entries, whatever the mix
    // of reads and writes.
    #[test]
    fn prop_capacity_enforcement(
        max_size in 1usize..20,
        ops in prop::collection::vec(store_op_strategy(), 1..200)
    ) {
        let mut store = EntryStore::new(max_size);

        for op in ops {
            match op {
                StoreOp::Set { key } => { store.set(entry(&key)); }
                StoreOp::Get { key } => { store.get(&key); }
            }
            prop_assert!(store.len() <= max_size, "size {} exceeds {}", store.len(), max_size);
        }
    }

    // Inserting a new key into a full store evicts the key touched longest ago.
    #[test]
    fn prop_evicts_least_recently_used(
        keys in prop::collection::hash_set(key_strategy(), 2..10),
        touched in any::<prop::sample::Index>()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut store = EntryStore::new(keys.len());
        for key in &keys {
            store.set(entry(key));
        }

        // Touch one key; the oldest untouched key becomes the victim
        let touched = touched.get(&keys).clone();
        store.get(&touched);
        let expected = keys.iter().find(|key| **key != touched).unwrap().clone();

        let evicted = store.set(entry("NEWCOMER"));
        prop_assert_eq!(evicted, Some(expected));
        prop_assert!(store.get(&touched).is_some());
    }

    // Key derivation ignores parameter insertion order and is stable.
    #[test]
    fn prop_key_order_independent(
        url in "https://[a-z]{1,8}\\.test/[a-z]{0,8}",
        params in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..8)
    ) {
        let forward: BTreeMap<String, String> = params.iter().cloned().collect();
        let reverse: BTreeMap<String, String> = params.iter().rev().cloned().collect();
        // Duplicated names resolve to different values depending on order
        let names: HashSet<&String> = params.iter().map(|(name, _)| name).collect();
        prop_assume!(names.len() == params.len());

        let headers = BTreeMap::new();
        let key = derive_key(&url, &forward, &headers);
        prop_assert_eq!(&key, &derive_key(&url, &reverse, &headers));
        prop_assert_eq!(&key, &derive_key(&url, &forward, &headers));
    }
}
