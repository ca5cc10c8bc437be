//! timecache - An in-process HTTP response cache
//!
//! Serves reads from a bounded LRU store under one of three strategies
//! (cache-first, network-first, stale-while-revalidate), collapses
//! concurrent identical requests, and layers freeze overrides, time-travel
//! snapshots, failure substitution and request analytics on top.

pub mod autofix;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod intelligence;
pub mod models;
pub mod storage;
pub mod tasks;
pub mod transport;

pub use autofix::{auto_fix_fn, AutoFixContext, AutoFixFn};
pub use cache::{derive_key, CacheEntry, CacheStats};
pub use client::{CacheClient, Strategy, SweepReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use history::HistorySnapshot;
pub use intelligence::{DuplicateGroup, Intelligence, RequestLogEntry, Suggestion, SuggestionKind};
pub use models::{GetOptions, HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use storage::{MemoryBackend, StorageBackend};
pub use tasks::spawn_maintenance_task;
pub use transport::{ReqwestTransport, Transport};
pub use tokio_util::sync::CancellationToken;
