//! Client Module
//!
//! The caching facade: cached reads through the strategy engine, uncached
//! writes straight to the transport, plus stats, freeze, time travel,
//! analytics and persistence.
//!
//! ```ignore
//! let client = CacheClient::new(CacheConfig::default(), Arc::new(ReqwestTransport::new()))?;
//! let users = client.get("https://api.example.com/users", GetOptions::new()).await?;
//! client.freeze(["https://api.example.com/users"]);
//! ```

mod dedup;
mod freeze;
mod strategy;

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{derive_key, display_url, CacheEntry, CacheStats, EntryStore, StatsCounters};
use crate::clock::{retention_cutoff, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::history::{parse_instant, HistoryStore};
use crate::intelligence::{Intelligence, RequestLog};
use crate::models::{GetOptions, HttpMethod, HttpResponse, RequestOptions};
use crate::storage::StorageBackend;
use crate::tasks::spawn_maintenance_task;
use crate::transport::{send_with_limits, Transport};

use dedup::{Deduplicator, SharedFetch};
use strategy::Fetch;

pub use freeze::FreezeOverlay;
pub use strategy::Strategy;

// == Client State ==
/// Everything a read may mutate. Locked only between suspension points.
struct ClientState {
    store: EntryStore,
    overlay: FreezeOverlay,
    history: HistoryStore,
    /// URL -> most recent successful network response
    last_successful: HashMap<String, HttpResponse>,
    counters: StatsCounters,
}

struct ClientInner {
    config: CacheConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    state: Mutex<ClientState>,
    requests: Arc<Mutex<RequestLog>>,
    dedup: Deduplicator,
}

impl ClientInner {
    /// Writes a fresh network response back to the store and history.
    fn record_success(&self, key: &str, url: &str, response: &HttpResponse) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if let Some(evicted) = state
            .store
            .set(CacheEntry::new(key, url, response.clone(), now))
        {
            debug!(cache_key = %evicted, "Evicted least recently used entry");
        }
        if self.config.enable_time_travel {
            state.history.record(url, response.clone(), now);
        }
        state
            .last_successful
            .insert(url.to_string(), response.clone());
    }
}

// == Sweep Report ==
/// What a maintenance sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub snapshots_removed: usize,
    pub log_entries_removed: usize,
}

// == Cache Client ==
/// An HTTP client that caches reads. Clones share one cache; separately
/// constructed clients share nothing.
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<ClientInner>,
}

impl CacheClient {
    // == Constructors ==
    /// Creates a client reading the system clock.
    pub fn new(config: CacheConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Creates a client with an explicit time source.
    pub fn with_clock(
        config: CacheConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let state = ClientState {
            store: EntryStore::new(config.max_size),
            overlay: FreezeOverlay::new(),
            history: HistoryStore::new(),
            last_successful: HashMap::new(),
            counters: StatsCounters::new(),
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                clock,
                state: Mutex::new(state),
                requests: Arc::new(Mutex::new(RequestLog::new())),
                dedup: Deduplicator::new(),
            }),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    // == Get ==
    /// Performs a cached read.
    ///
    /// Time travel (`options.at`) is resolved from history alone; otherwise a
    /// frozen value wins, and the chosen strategy handles the rest.
    pub async fn get(&self, url: &str, options: GetOptions) -> Result<HttpResponse> {
        let GetOptions {
            request,
            strategy,
            at,
            auto_fix,
            origin,
        } = options;

        self.track(url, &request, origin);

        if let Some(at) = at {
            return self.time_travel(url, &at);
        }

        let key = derive_key(url, &request.params, &request.headers);
        if let Some(response) = self.frozen_response(&key) {
            return Ok(response);
        }

        let strategy = strategy.unwrap_or(self.inner.config.strategy);
        let fetch = Fetch {
            key,
            url: url.to_string(),
            options: request,
            auto_fix,
        };

        match strategy {
            Strategy::CacheFirst => self.cache_first(fetch).await,
            Strategy::NetworkFirst => self.network_first(fetch).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(fetch).await,
        }
    }

    // == Uncached Verbs ==
    pub async fn post(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<HttpResponse> {
        self.send_uncached(HttpMethod::Post, url, data, options).await
    }

    pub async fn put(&self, url: &str, data: Option<Value>, options: RequestOptions) -> Result<HttpResponse> {
        self.send_uncached(HttpMethod::Put, url, data, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<HttpResponse> {
        self.send_uncached(HttpMethod::Delete, url, None, options).await
    }

    async fn send_uncached(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let request = options.to_request(method, url, data);
        send_with_limits(
            self.inner.transport.as_ref(),
            request,
            options.timeout,
            options.cancel,
        )
        .await
    }

    // == Stats ==
    /// Returns hit/miss counters and the current entry store size.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        state
            .counters
            .snapshot(state.store.len(), state.store.evictions())
    }

    // == Clear Cache ==
    /// Empties the entry store and resets counters. History and frozen
    /// values are kept.
    pub fn clear_cache(&self) {
        let mut state = self.inner.state.lock();
        let cleared = state.store.len();
        state.store.clear();
        state.counters.reset();
        info!(cleared, "Cache cleared");
    }

    // == Freeze ==
    /// Pins the currently cached values of each URL. URLs with nothing
    /// cached are skipped. Returns the number of keys pinned.
    pub fn freeze<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.inner.state.lock();
        let mut pinned = 0;

        for url in urls {
            let url = url.as_ref();
            let entries: Vec<CacheEntry> = state.store.entries_for_url(url).cloned().collect();
            if entries.is_empty() {
                info!(url, "Nothing cached to freeze");
                continue;
            }

            info!(url, keys = entries.len(), "Freezing cached response");
            pinned += entries.len();
            for entry in entries {
                state.overlay.freeze(entry);
            }
        }

        pinned
    }

    /// Releases every pinned key of `url`. Returns how many were released.
    pub fn unfreeze(&self, url: &str) -> usize {
        let released = self.inner.state.lock().overlay.unfreeze_url(url);
        info!(url, released, "Unfroze");
        released
    }

    pub fn unfreeze_all(&self) -> usize {
        let released = self.inner.state.lock().overlay.clear();
        info!(released, "Unfroze all");
        released
    }

    pub fn is_frozen(&self, url: &str) -> bool {
        self.inner.state.lock().overlay.is_url_frozen(url)
    }

    pub fn frozen_count(&self) -> usize {
        self.inner.state.lock().overlay.len()
    }

    fn frozen_response(&self, key: &str) -> Option<HttpResponse> {
        let mut state = self.inner.state.lock();
        let response = state.overlay.get(key)?.response.clone();
        state.counters.record_hit();
        debug!(cache_key = %key, "Serving frozen response");
        Some(response)
    }

    // == Time Travel ==
    fn time_travel(&self, url: &str, at: &str) -> Result<HttpResponse> {
        if !self.inner.config.enable_time_travel {
            return Err(CacheError::NoHistory(url.to_string()));
        }

        let instant = parse_instant(at)?;
        let state = self.inner.state.lock();
        let snapshot = state
            .history
            .nearest(url, instant)
            .ok_or_else(|| CacheError::NoHistory(url.to_string()))?;

        debug!(url, requested = %instant, resolved = %snapshot.timestamp, "Time travel read");
        Ok(snapshot.response.clone())
    }

    // == Intelligence ==
    pub fn intelligence(&self) -> Intelligence {
        Intelligence::new(Arc::clone(&self.inner.requests))
    }

    fn track(&self, url: &str, request: &RequestOptions, origin: Option<String>) {
        if !self.inner.config.enable_intelligence_panel {
            return;
        }
        let now = self.inner.clock.now();
        self.inner
            .requests
            .lock()
            .record(display_url(url, &request.params), now, origin);
    }

    // == Sweep ==
    /// Drops history snapshots and log entries older than their retention
    /// windows.
    pub fn sweep(&self) -> SweepReport {
        let now = self.inner.clock.now();
        let config = &self.inner.config;

        // A retention reaching past the earliest instant keeps everything
        let snapshots_removed = retention_cutoff(now, config.history_retention)
            .map_or(0, |cutoff| self.inner.state.lock().history.prune(cutoff));
        let log_entries_removed = retention_cutoff(now, config.analytics_retention)
            .map_or(0, |cutoff| self.inner.requests.lock().prune(cutoff));

        SweepReport {
            snapshots_removed,
            log_entries_removed,
        }
    }

    /// Runs [`CacheClient::sweep`] every `sweep_interval` until aborted.
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        spawn_maintenance_task(self.clone(), self.inner.config.sweep_interval)
    }

    /// Number of keys with a network request in flight.
    pub fn pending_requests(&self) -> usize {
        self.inner.dedup.in_flight()
    }

    // == Persistence ==
    /// Loads serialized entries from `backend` into the entry store.
    ///
    /// Records that fail to parse are skipped. Entries are inserted oldest
    /// first so that the newest survive when the backend holds more than
    /// `max_size`. Returns the number of entries loaded.
    pub async fn preload(&self, backend: &dyn StorageBackend) -> Result<usize> {
        let mut loaded = Vec::new();

        for key in backend.keys().await? {
            let Some(raw) = backend.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) => loaded.push(entry),
                Err(err) => warn!(storage_key = %key, error = %err, "Skipping unreadable entry"),
            }
        }

        loaded.sort_by_key(|entry| entry.stored_at);
        let now = self.inner.clock.now();
        let count = loaded.len();

        let mut state = self.inner.state.lock();
        for mut entry in loaded {
            if entry.stored_at > now {
                entry.stored_at = now;
            }
            state.store.set(entry);
        }

        info!(count, "Preloaded cache entries");
        Ok(count)
    }

    /// Writes every entry of the entry store to `backend`.
    pub async fn persist(&self, backend: &dyn StorageBackend) -> Result<usize> {
        let entries: Vec<CacheEntry> = self.inner.state.lock().store.iter().cloned().collect();

        for entry in &entries {
            backend.set(&entry.key, serde_json::to_string(entry)?).await?;
        }

        info!(count = entries.len(), "Persisted cache entries");
        Ok(entries.len())
    }

    // == Start Fetch ==
    /// Joins or starts the deduplicated network fetch for a read. A
    /// successful response is written back before the flight completes.
    fn start_fetch(&self, fetch: &Fetch) -> (SharedFetch, bool) {
        self.inner.dedup.run(&fetch.key, || {
            let inner = Arc::clone(&self.inner);
            let key = fetch.key.clone();
            let url = fetch.url.clone();
            let request = fetch.options.to_request(HttpMethod::Get, &fetch.url, None);
            let timeout = fetch.options.timeout;
            let cancel = fetch.options.cancel.clone();

            async move {
                let outcome =
                    send_with_limits(inner.transport.as_ref(), request, timeout, cancel).await;
                if let Ok(response) = &outcome {
                    inner.record_success(&key, &url, response);
                }
                outcome
            }
            .boxed()
        })
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
