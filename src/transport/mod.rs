//! Transport Module
//!
//! The network collaborator the cache sits in front of.

mod http;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, Result};
use crate::models::{HttpRequest, HttpResponse};

pub use http::ReqwestTransport;

/// Sends requests over the network.
///
/// Implementations return `CacheError::Transport` for connection failures
/// and non-success statuses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// == Send With Limits ==
/// Sends `request`, giving up with `CacheError::Aborted` when `timeout`
/// elapses or `cancel` fires first.
pub(crate) async fn send_with_limits(
    transport: &dyn Transport,
    request: HttpRequest,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
) -> Result<HttpResponse> {
    with_limits(transport.send(request), timeout, cancel).await
}

/// Awaits `outcome` under a caller's timeout and cancellation token.
///
/// Giving up only drops this caller's interest in `outcome`.
pub(crate) async fn with_limits<F>(
    outcome: F,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
) -> Result<HttpResponse>
where
    F: Future<Output = Result<HttpResponse>>,
{
    let bounded = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, outcome).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CacheError::Aborted(format!(
                    "timed out after {}ms",
                    limit.as_millis()
                ))),
            },
            None => outcome.await,
        }
    };

    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(CacheError::Aborted("request cancelled".into())),
            outcome = bounded => outcome,
        },
        None => bounded.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;
    use serde_json::json;

    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(HttpResponse::ok(json!("late")))
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "https://api.test/slow")
    }

    #[tokio::test]
    async fn test_timeout_aborts() {
        let outcome = send_with_limits(&SlowTransport, request(), Some(Duration::from_millis(10)), None).await;
        assert!(matches!(outcome, Err(CacheError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_cancel_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = send_with_limits(&SlowTransport, request(), None, Some(token)).await;
        assert!(matches!(outcome, Err(CacheError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_limits_apply_to_any_future() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(HttpResponse::ok(json!("late")))
        };
        let outcome = with_limits(slow, Some(Duration::from_millis(10)), None).await;
        assert!(matches!(outcome, Err(CacheError::Aborted(_))));

        let ready = async { Ok(HttpResponse::ok(json!("now"))) };
        let outcome = with_limits(ready, Some(Duration::from_millis(10)), None).await;
        assert_eq!(outcome.unwrap().data, json!("now"));
    }

    #[tokio::test]
    async fn test_unlimited_send_completes() {
        let outcome = send_with_limits(&SlowTransport, request(), None, None).await;
        assert_eq!(outcome.unwrap().data, json!("late"));
    }
}
