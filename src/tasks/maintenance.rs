//! Maintenance Task
//!
//! Background task that periodically sweeps retention-bound state. Reads
//! never prune; only this sweep does.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::CacheClient;

/// Spawns a background task that sweeps `client` every `interval`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// when the client is no longer needed.
///
/// # Example
/// ```ignore
/// let handle = spawn_maintenance_task(client.clone(), Duration::from_secs(60));
/// // Later:
/// handle.abort();
/// ```
pub fn spawn_maintenance_task(client: CacheClient, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = client.sweep();

            if report.snapshots_removed > 0 || report.log_entries_removed > 0 {
                info!(
                    snapshots = report.snapshots_removed,
                    log_entries = report.log_entries_removed,
                    "Maintenance sweep pruned expired records"
                );
            } else {
                debug!("Maintenance sweep: nothing to prune");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::clock::{Clock, ManualClock};
    use crate::config::CacheConfig;
    use crate::error::{CacheError, Result};
    use crate::models::{GetOptions, HttpRequest, HttpResponse};
    use crate::transport::Transport;

    struct EchoTransport;

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            Ok(HttpResponse::ok(json!(request.url)))
        }
    }

    fn client(clock: &ManualClock) -> CacheClient {
        let config = CacheConfig::default().with_time_travel(true);
        CacheClient::with_clock(config, Arc::new(EchoTransport), Arc::new(clock.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_maintenance_task_prunes_old_history() {
        let clock = ManualClock::default();
        let client = client(&clock);
        let url = "https://api.test/history";

        client.get(url, GetOptions::new()).await.unwrap();
        let at = clock.now().to_rfc3339();
        assert!(client.get(url, GetOptions::new().at(at.clone())).await.is_ok());

        clock.advance(Duration::from_secs(8 * 24 * 60 * 60));
        let handle = spawn_maintenance_task(client.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.abort();

        let result = client.get(url, GetOptions::new().at(at)).await;
        assert!(matches!(result, Err(CacheError::NoHistory(_))));
    }

    #[tokio::test]
    async fn test_maintenance_task_preserves_recent_history() {
        let clock = ManualClock::default();
        let client = client(&clock);
        let url = "https://api.test/recent";

        client.get(url, GetOptions::new()).await.unwrap();
        let handle = spawn_maintenance_task(client.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(40)).await;
        handle.abort();

        let at = clock.now().to_rfc3339();
        assert!(client.get(url, GetOptions::new().at(at)).await.is_ok());
    }

    #[tokio::test]
    async fn test_maintenance_task_can_be_aborted() {
        let clock = ManualClock::default();
        let handle = spawn_maintenance_task(client(&clock), Duration::from_secs(1));

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
