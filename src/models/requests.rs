//! Request types and per-call options
//!
//! `RequestOptions` carries pass-through transport settings; `GetOptions`
//! adds the cache-specific knobs of a read.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::autofix::{auto_fix_fn, AutoFixContext, AutoFixFn};
use crate::client::Strategy;
use crate::error::CacheError;

// == Http Method ==
/// Verbs understood by the transport. Only `Get` is ever cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

// == Http Request ==
/// A fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Query parameters, kept sorted by name
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    /// JSON body for POST/PUT
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a request without parameters, headers or body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

// == Request Options ==
/// Pass-through transport options shared by every verb.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters
    pub params: BTreeMap<String, String>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Abort the transport call after this long
    pub timeout: Option<Duration>,
    /// Abort the transport call when this token is cancelled
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets a header. Names are stored lowercased, so a later call with a
    /// different casing replaces the earlier value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Builds the transport request for `method` and `url`.
    pub(crate) fn to_request(&self, method: HttpMethod, url: &str, body: Option<Value>) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            params: self.params.clone(),
            headers: self.headers.clone(),
            body,
        }
    }
}

// == Get Options ==
/// Options for a cached read.
#[derive(Clone, Default)]
pub struct GetOptions {
    /// Transport options; params and authorization headers feed the cache key
    pub request: RequestOptions,
    /// Overrides the client's default strategy for this call only
    pub strategy: Option<Strategy>,
    /// ISO-8601 instant for a time travel read
    pub at: Option<String>,
    /// Substitution function consulted when the request cannot be satisfied
    pub auto_fix: Option<AutoFixFn>,
    /// Name of the calling component, recorded by the analytics log
    pub origin: Option<String>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.param(name, value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request = self.request.timeout(timeout);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.request = self.request.cancel(token);
        self
    }

    pub fn at(mut self, instant: impl Into<String>) -> Self {
        self.at = Some(instant.into());
        self
    }

    /// Installs a substitution function.
    pub fn auto_fix<F>(mut self, fix: F) -> Self
    where
        F: Fn(&CacheError, &AutoFixContext) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.auto_fix = Some(auto_fix_fn(fix));
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl fmt::Debug for GetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetOptions")
            .field("request", &self.request)
            .field("strategy", &self.strategy)
            .field("at", &self.at)
            .field("auto_fix", &self.auto_fix.is_some())
            .field("origin", &self.origin)
            .finish()
    }
}
