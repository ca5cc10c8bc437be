//! Cache Key Derivation
//!
//! Maps a logical request (URL, query parameters, credentials) to the string
//! under which its response is cached.

use std::collections::BTreeMap;

/// Headers that distinguish otherwise identical requests. Matched
/// case-insensitively; every other header is ignored.
pub const KEYED_HEADERS: &[&str] = &["authorization"];

// == Derive Key ==
/// Derives the cache key for a read.
///
/// Parameters are appended in name order, so insertion order never matters.
/// A credential header is appended as a suffix so responses are never shared
/// across credentials.
pub fn derive_key(
    url: &str,
    params: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
) -> String {
    let mut key = url.to_string();

    if !params.is_empty() {
        key.push_str("::params=");
        // BTreeMap serializes in key order
        key.push_str(&serde_json::to_string(params).unwrap_or_default());
    }

    // Every case variant of a keyed header is sent, so every one is keyed
    for name in KEYED_HEADERS {
        let credentials = headers
            .iter()
            .filter(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value);
        for value in credentials {
            key.push_str("::");
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
    }

    key
}

// == Display Url ==
/// Renders the URL with its parameters folded into the query string, for
/// the analytics log.
pub fn display_url(url: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Strips the query string from a URL.
pub fn base_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
