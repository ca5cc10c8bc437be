//! Request Log
//!
//! Append-only record of cached reads, pruned by age.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogEntry {
    /// URL with its query parameters
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// Calling component, when the caller named one
    pub origin: Option<String>,
}

#[derive(Debug, Default)]
pub struct RequestLog {
    entries: Vec<RequestLogEntry>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, url: impl Into<String>, timestamp: DateTime<Utc>, origin: Option<String>) {
        self.entries.push(RequestLogEntry {
            url: url.into(),
            timestamp,
            origin,
        });
    }

    pub fn entries(&self) -> &[RequestLogEntry] {
        &self.entries
    }

    /// Drops entries logged before `cutoff`, returning how many were removed.
    pub fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timestamp >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
