//! Strategy Engine
//!
//! The three read policies, run against the entry store and the transport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::autofix::{self, AutoFixContext, AutoFixFn};
use crate::client::CacheClient;
use crate::error::{CacheError, Result};
use crate::models::{HttpResponse, RequestOptions};
use crate::transport::with_limits;

// == Strategy ==
/// How a read balances the cache against the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache unless absent or expired, then fetch
    #[default]
    CacheFirst,
    /// Always fetch, fall back to any cached value on failure
    NetworkFirst,
    /// Serve any cached value at once, refresh in the background if expired
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache-first" => Ok(Strategy::CacheFirst),
            "network-first" => Ok(Strategy::NetworkFirst),
            "stale-while-revalidate" => Ok(Strategy::StaleWhileRevalidate),
            other => Err(CacheError::InvalidConfig(format!("unknown strategy: {other}"))),
        }
    }
}

// == Fetch ==
/// One read on its way through the strategy engine.
#[derive(Clone)]
pub(crate) struct Fetch {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) options: RequestOptions,
    pub(crate) auto_fix: Option<AutoFixFn>,
}

impl CacheClient {
    // == Cache First ==
    pub(crate) async fn cache_first(&self, fetch: Fetch) -> Result<HttpResponse> {
        let cached = {
            let mut state = self.inner.state.lock();
            let now = self.inner.clock.now();
            let max_age = self.inner.config.max_age;
            match state
                .store
                .get(&fetch.key)
                .filter(|entry| !entry.is_expired(now, max_age))
            {
                Some(entry) => {
                    state.counters.record_hit();
                    Some(entry.response)
                }
                None => {
                    state.counters.record_miss();
                    None
                }
            }
        };

        if let Some(response) = cached {
            debug!(cache_key = %fetch.key, "Cache HIT");
            return Ok(response);
        }

        debug!(cache_key = %fetch.key, "Cache MISS, fetching from network");
        match self.fetch_network(&fetch).await {
            Ok(response) => Ok(response),
            Err(err) => self.recover(&fetch, err),
        }
    }

    // == Network First ==
    /// Stats are recorded once the final outcome is known: a miss for a
    /// network answer, a hit for a cache fallback.
    pub(crate) async fn network_first(&self, fetch: Fetch) -> Result<HttpResponse> {
        let err = match self.fetch_network(&fetch).await {
            Ok(response) => {
                self.inner.state.lock().counters.record_miss();
                return Ok(response);
            }
            Err(err) => err,
        };

        let fallback = {
            let mut state = self.inner.state.lock();
            let fallback = if err.is_aborted() {
                None
            } else {
                state.store.get(&fetch.key).map(|entry| entry.response)
            };
            match fallback {
                Some(_) => state.counters.record_hit(),
                None => state.counters.record_miss(),
            }
            fallback
        };

        match fallback {
            Some(response) => {
                debug!(cache_key = %fetch.key, error = %err, "Network failed, serving cached response");
                Ok(response)
            }
            None => self.recover(&fetch, err),
        }
    }

    // == Stale While Revalidate ==
    pub(crate) async fn stale_while_revalidate(&self, fetch: Fetch) -> Result<HttpResponse> {
        let cached = {
            let mut state = self.inner.state.lock();
            let now = self.inner.clock.now();
            let max_age = self.inner.config.max_age;
            let cached = state
                .store
                .get(&fetch.key)
                .map(|entry| (entry.is_expired(now, max_age), entry.response));
            match cached {
                Some(_) => state.counters.record_hit(),
                None => state.counters.record_miss(),
            }
            cached
        };

        match cached {
            Some((expired, response)) => {
                if expired {
                    debug!(cache_key = %fetch.key, "Cache HIT (stale), revalidating in background");
                    self.revalidate(&fetch);
                } else {
                    debug!(cache_key = %fetch.key, "Cache HIT");
                }
                Ok(response)
            }
            None => {
                debug!(cache_key = %fetch.key, "Cache MISS, fetching from network");
                match self.fetch_network(&fetch).await {
                    Ok(response) => Ok(response),
                    Err(err) => self.recover(&fetch, err),
                }
            }
        }
    }

    // == Revalidate ==
    /// Starts a detached refresh. Its failure is logged and never reaches
    /// the caller, who already has the stale value.
    fn revalidate(&self, fetch: &Fetch) {
        let mut background = fetch.clone();
        // The triggering caller's cancellation must not cut the refresh short
        background.options.cancel = None;

        let (outcome, joined) = self.start_fetch(&background);
        if joined {
            return;
        }

        let key = background.key;
        tokio::spawn(async move {
            if let Err(err) = outcome.await {
                warn!(cache_key = %key, error = %err, "Background refresh failed");
            }
        });
    }

    async fn fetch_network(&self, fetch: &Fetch) -> Result<HttpResponse> {
        let (outcome, joined) = self.start_fetch(fetch);
        if !joined {
            return outcome.await;
        }

        // The flight runs under its starter's limits; a joiner waits under its own
        let options = &fetch.options;
        with_limits(outcome, options.timeout, options.cancel.clone()).await
    }

    // == Recover ==
    /// Last resort after the strategy's own fallbacks are exhausted.
    fn recover(&self, fetch: &Fetch, err: CacheError) -> Result<HttpResponse> {
        let Some(fix) = fetch.auto_fix.as_ref() else {
            return Err(err);
        };
        if err.is_aborted() {
            return Err(err);
        }

        let context = {
            let state = self.inner.state.lock();
            AutoFixContext {
                url: fetch.url.clone(),
                error: err.clone(),
                last_successful: state.last_successful.get(&fetch.url).cloned(),
                history: state.history.snapshots(&fetch.url).to_vec(),
            }
        };

        autofix::attempt(fix, &context).ok_or(err)
    }
}
