//! reqwest-backed transport

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Transport over a shared `reqwest::Client`.
///
/// Bodies are decoded as JSON when possible and kept as a string otherwise.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, default headers, TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| CacheError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CacheError::transport(err.to_string()))?;

        let response = HttpResponse {
            status,
            headers,
            data: decode_body(&bytes),
            auto_fixed: false,
        };

        if !response.is_success() {
            return Err(CacheError::from_response(response));
        }
        Ok(response)
    }
}
