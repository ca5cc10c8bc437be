//! Request Deduplication
//!
//! Collapses concurrent fetches of one cache key into a single in-flight
//! operation whose outcome every waiter shares.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::HttpResponse;

/// Outcome of an in-flight fetch, cloneable to every waiter.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<HttpResponse>>>;

struct Flight {
    id: u64,
    outcome: SharedFetch,
}

#[derive(Default)]
struct PendingMap {
    flights: HashMap<String, Flight>,
    next_id: u64,
}

// == Deduplicator ==
#[derive(Clone, Default)]
pub(crate) struct Deduplicator {
    pending: Arc<Mutex<PendingMap>>,
}

impl Deduplicator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // == Run ==
    /// Joins the in-flight operation for `key`, or starts one built by `start`.
    ///
    /// Returns the shared outcome and whether an existing flight was joined.
    /// The operation runs on its own task and unregisters itself before its
    /// outcome is published, so a finished flight is never joined and
    /// dropping every waiter cannot leave a stale registration behind.
    pub(crate) fn run<F>(&self, key: &str, start: F) -> (SharedFetch, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<HttpResponse>>,
    {
        let mut pending = self.pending.lock();
        if let Some(flight) = pending.flights.get(key) {
            debug!(cache_key = %key, "Joining in-flight request");
            return (flight.outcome.clone(), true);
        }

        let id = pending.next_id;
        pending.next_id += 1;

        let operation = start();
        let registry = Arc::clone(&self.pending);
        let owned_key = key.to_string();
        let handle = tokio::spawn(async move {
            let outcome = operation.await;
            let mut pending = registry.lock();
            if pending
                .flights
                .get(&owned_key)
                .is_some_and(|flight| flight.id == id)
            {
                pending.flights.remove(&owned_key);
            }
            outcome
        });

        let outcome = async move {
            handle.await.unwrap_or_else(|err| {
                Err(CacheError::Aborted(format!(
                    "in-flight request did not complete: {err}"
                )))
            })
        }
        .boxed()
        .shared();

        pending.flights.insert(
            key.to_string(),
            Flight {
                id,
                outcome: outcome.clone(),
            },
        );
        (outcome, false)
    }

    /// Number of keys with a request currently in flight.
    pub(crate) fn in_flight(&self) -> usize {
        self.pending.lock().flights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counted(calls: &Arc<AtomicUsize>, outcome: Result<HttpResponse>) -> BoxFuture<'static, Result<HttpResponse>> {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            outcome
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_one_operation() {
        let dedup = Deduplicator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (first, joined_first) = dedup.run("k", || counted(&calls, Ok(HttpResponse::ok(json!(1)))));
        let (second, joined_second) = dedup.run("k", || counted(&calls, Ok(HttpResponse::ok(json!(2)))));

        assert!(!joined_first);
        assert!(joined_second);
        assert_eq!(dedup.in_flight(), 1);

        let (a, b) = futures::join!(first, second);
        assert_eq!(a.unwrap().data, json!(1));
        assert_eq!(b.unwrap().data, json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dedup.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failure_releases_registration() {
        let dedup = Deduplicator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (outcome, _) = dedup.run("k", || counted(&calls, Err(CacheError::transport("down"))));
        assert!(outcome.await.is_err());
        assert_eq!(dedup.in_flight(), 0);

        let (outcome, joined) = dedup.run("k", || counted(&calls, Ok(HttpResponse::ok(json!("retry")))));
        assert!(!joined);
        assert_eq!(outcome.await.unwrap().data, json!("retry"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropped_waiters_still_release() {
        let dedup = Deduplicator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (outcome, _) = dedup.run("k", || counted(&calls, Ok(HttpResponse::ok(json!(1)))));
        drop(outcome);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(dedup.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share() {
        let dedup = Deduplicator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, _) = dedup.run("a", || counted(&calls, Ok(HttpResponse::ok(json!("a")))));
        let (b, joined) = dedup.run("b", || counted(&calls, Ok(HttpResponse::ok(json!("b")))));

        assert!(!joined);
        assert_eq!(a.await.unwrap().data, json!("a"));
        assert_eq!(b.await.unwrap().data, json!("b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
