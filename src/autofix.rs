//! Failure Substitution
//!
//! When a read cannot be satisfied from the network or the cache, a
//! caller-supplied function may produce a stand-in value. Substituted
//! responses are returned to the caller only; they are never cached.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::history::HistorySnapshot;
use crate::models::HttpResponse;

/// Substitution function: `Ok(Some(value))` substitutes, `Ok(None)` declines.
/// Errors are logged and treated as a decline.
pub type AutoFixFn =
    Arc<dyn Fn(&CacheError, &AutoFixContext) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Wraps a closure as an [`AutoFixFn`].
pub fn auto_fix_fn<F>(fix: F) -> AutoFixFn
where
    F: Fn(&CacheError, &AutoFixContext) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(fix)
}

// == Auto Fix Context ==
/// What the substitution function gets to look at.
#[derive(Debug, Clone)]
pub struct AutoFixContext {
    pub url: String,
    /// The failure being recovered from
    pub error: CacheError,
    /// Most recent successful network response for the URL
    pub last_successful: Option<HttpResponse>,
    /// Snapshots recorded for the URL, oldest first
    pub history: Vec<HistorySnapshot>,
}

// == Attempt ==
/// Runs the substitution function, returning a synthesized success response
/// when it produced a value.
pub(crate) fn attempt(fix: &AutoFixFn, context: &AutoFixContext) -> Option<HttpResponse> {
    match fix(&context.error, context) {
        Ok(Some(value)) => {
            debug!(url = %context.url, "Auto-fix substituted a response");
            Some(HttpResponse::substituted(value))
        }
        Ok(None) => {
            debug!(url = %context.url, "Auto-fix declined");
            None
        }
        Err(err) => {
            warn!(url = %context.url, error = %err, "Auto-fix function failed");
            None
        }
    }
}
