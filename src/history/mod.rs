//! History Module
//!
//! Per-URL log of responses observed from the network, used for time
//! travel reads. Snapshots are appended in arrival order and pruned only by
//! the periodic sweep.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::models::HttpResponse;

// == History Snapshot ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub timestamp: DateTime<Utc>,
    pub response: HttpResponse,
}

// == History Store ==
#[derive(Debug, Default)]
pub struct HistoryStore {
    snapshots: HashMap<String, Vec<HistorySnapshot>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Appends a snapshot for `url`.
    pub fn record(&mut self, url: &str, response: HttpResponse, timestamp: DateTime<Utc>) {
        self.snapshots
            .entry(url.to_string())
            .or_default()
            .push(HistorySnapshot { timestamp, response });
    }

    // == Nearest ==
    /// Finds the snapshot closest to `at`.
    ///
    /// Distance is the absolute time difference; on a tie the snapshot
    /// appended first wins.
    pub fn nearest(&self, url: &str, at: DateTime<Utc>) -> Option<&HistorySnapshot> {
        let mut best: Option<(&HistorySnapshot, i64)> = None;

        for snapshot in self.snapshots.get(url)? {
            let distance = (snapshot.timestamp - at).num_milliseconds().abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((snapshot, distance)),
            }
        }

        best.map(|(snapshot, _)| snapshot)
    }

    /// Returns every snapshot recorded for `url`, oldest first.
    pub fn snapshots(&self, url: &str) -> &[HistorySnapshot] {
        self.snapshots.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    // == Prune ==
    /// Drops snapshots recorded before `cutoff`. Returns how many were removed.
    pub fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;

        self.snapshots.retain(|_, snapshots| {
            let before = snapshots.len();
            snapshots.retain(|snapshot| snapshot.timestamp >= cutoff);
            removed += before - snapshots.len();
            !snapshots.is_empty()
        });

        removed
    }

    /// Total number of snapshots across all URLs.
    pub fn len(&self) -> usize {
        self.snapshots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

// == Parse Instant ==
/// Parses an ISO-8601 instant. RFC 3339 with an offset is preferred; a
/// bare date-time or date is read as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(CacheError::InvalidTimestamp(value.to_string()))
}
