//! Intelligence Module
//!
//! Passive analytics over the reads a client has served: duplicate
//! detection and optimization hints.

mod log;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::base_url;

pub use log::{RequestLog, RequestLogEntry};

/// A URL is reported as duplicated once it was requested more often than this.
pub const DUPLICATE_THRESHOLD: usize = 3;

/// A URL requested more often than this gets a cache duration hint.
pub const HOT_URL_THRESHOLD: usize = 10;

// == Duplicate Group ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub url: String,
    /// Total logged occurrences
    pub count: usize,
    /// Distinct calling components, sorted
    pub components: Vec<String>,
}

// == Suggestion ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Several parameterized variants of one endpoint could be fetched together
    GroupRequests,
    /// The URL is hot enough to deserve a longer max age
    IncreaseCacheDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// Base URL for grouping hints, full URL for duration hints
    pub target: String,
    pub count: usize,
    pub message: String,
}

// == Intelligence Handle ==
/// Read access to a client's request log.
#[derive(Debug, Clone)]
pub struct Intelligence {
    log: Arc<Mutex<RequestLog>>,
}

impl Intelligence {
    pub(crate) fn new(log: Arc<Mutex<RequestLog>>) -> Self {
        Self { log }
    }

    /// Returns every logged read, oldest first.
    pub fn request_history(&self) -> Vec<RequestLogEntry> {
        self.log.lock().entries().to_vec()
    }

    pub fn detect_duplicates(&self) -> Vec<DuplicateGroup> {
        detect_duplicates(self.log.lock().entries())
    }

    pub fn suggest_optimizations(&self) -> Vec<Suggestion> {
        suggest_optimizations(self.log.lock().entries())
    }
}

// == Detect Duplicates ==
/// Groups entries by exact URL and keeps groups above the duplicate
/// threshold, most requested first.
pub fn detect_duplicates(entries: &[RequestLogEntry]) -> Vec<DuplicateGroup> {
    let mut groups: HashMap<&str, (usize, BTreeSet<&str>)> = HashMap::new();

    for entry in entries {
        let (count, components) = groups.entry(entry.url.as_str()).or_default();
        *count += 1;
        if let Some(origin) = entry.origin.as_deref() {
            components.insert(origin);
        }
    }

    let mut duplicates: Vec<DuplicateGroup> = groups
        .into_iter()
        .filter(|(_, (count, _))| *count > DUPLICATE_THRESHOLD)
        .map(|(url, (count, components))| DuplicateGroup {
            url: url.to_string(),
            count,
            components: components.into_iter().map(str::to_string).collect(),
        })
        .collect();

    duplicates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.url.cmp(&b.url)));
    duplicates
}

// == Suggest Optimizations ==
/// Builds grouping hints for duplicated endpoints that are hit with several
/// parameter sets, followed by cache duration hints for hot URLs.
pub fn suggest_optimizations(entries: &[RequestLogEntry]) -> Vec<Suggestion> {
    let duplicates = detect_duplicates(entries);
    let mut suggestions = Vec::new();

    let mut by_base: BTreeMap<&str, Vec<&DuplicateGroup>> = BTreeMap::new();
    for group in &duplicates {
        by_base.entry(base_url(&group.url)).or_default().push(group);
    }

    for (base, variants) in by_base {
        if variants.len() > 1 {
            let count = variants.iter().map(|group| group.count).sum();
            suggestions.push(Suggestion {
                kind: SuggestionKind::GroupRequests,
                target: base.to_string(),
                count,
                message: format!(
                    "{} parameter variants of {} were requested {} times; consider fetching them in one request",
                    variants.len(),
                    base,
                    count
                ),
            });
        }
    }

    for group in duplicates.iter().filter(|group| group.count > HOT_URL_THRESHOLD) {
        suggestions.push(Suggestion {
            kind: SuggestionKind::IncreaseCacheDuration,
            target: group.url.clone(),
            count: group.count,
            message: format!(
                "{} was requested {} times; consider increasing its cache duration",
                group.url, group.count
            ),
        });
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entries(rows: &[(&str, usize, Option<&str>)]) -> Vec<RequestLogEntry> {
        let now = Utc::now();
        rows.iter()
            .flat_map(|(url, times, origin)| {
                (0..*times).map(move |_| RequestLogEntry {
                    url: url.to_string(),
                    timestamp: now,
                    origin: origin.map(str::to_string),
                })
            })
            .collect()
    }

    #[test]
    fn test_duplicates_need_more_than_threshold() {
        let log = entries(&[("https://api.test/a", 3, None), ("https://api.test/b", 4, None)]);
        let duplicates = detect_duplicates(&log);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].url, "https://api.test/b");
        assert_eq!(duplicates[0].count, 4);
    }

    #[test]
    fn test_duplicates_sorted_with_components() {
        let log = entries(&[
            ("https://api.test/a", 5, Some("Sidebar")),
            ("https://api.test/b", 2, Some("Header")),
            ("https://api.test/b", 5, Some("Footer")),
            ("https://api.test/a", 1, Some("Header")),
            ("https://api.test/a", 1, None),
        ]);
        let duplicates = detect_duplicates(&log);

        assert_eq!(duplicates[0].url, "https://api.test/a");
        assert_eq!(duplicates[0].count, 7);
        assert_eq!(duplicates[0].components, vec!["Header", "Sidebar"]);
        assert_eq!(duplicates[1].count, 7);
        assert_eq!(duplicates[1].components, vec!["Footer", "Header"]);
    }

    #[test]
    fn test_group_suggestion_for_parameter_variants() {
        let log = entries(&[
            ("https://api.test/users?id=1", 4, None),
            ("https://api.test/users?id=2", 5, None),
            ("https://api.test/posts", 4, None),
        ]);
        let suggestions = suggest_optimizations(&log);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, SuggestionKind::GroupRequests);
        assert_eq!(suggestions[0].target, "https://api.test/users");
        assert_eq!(suggestions[0].count, 9);
    }

    #[test]
    fn test_duration_suggestion_for_hot_url() {
        let log = entries(&[("https://api.test/config", 11, None), ("https://api.test/warm", 10, None)]);
        let suggestions = suggest_optimizations(&log);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, SuggestionKind::IncreaseCacheDuration);
        assert_eq!(suggestions[0].target, "https://api.test/config");
        assert_eq!(suggestions[0].count, 11);
    }

    #[test]
    fn test_no_suggestions_for_quiet_log() {
        assert!(suggest_optimizations(&entries(&[("https://api.test/a", 2, None)])).is_empty());
    }
}
