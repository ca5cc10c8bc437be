//! Cache Entry Module
//!
//! Defines the structure for individual cache entries. Expiry is derived
//! from `stored_at` and the configured max age, never stored.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::to_time_delta;
use crate::models::HttpResponse;

// == Cache Entry ==
/// A response observed for one cache key. Entries are replaced, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Derived cache key
    pub key: String,
    /// Logical URL the key was derived from
    pub url: String,
    /// The stored response
    pub response: HttpResponse,
    /// When the response was stored
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(
        key: impl Into<String>,
        url: impl Into<String>,
        response: HttpResponse,
        stored_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            response,
            stored_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `max_age` as of `now`.
    ///
    /// Boundary condition: an entry exactly `max_age` old is still fresh;
    /// it expires once its age strictly exceeds `max_age`.
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.stored_at) > to_time_delta(max_age)
    }
}
