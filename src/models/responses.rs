//! Response types returned by the transport and the cache client

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header attached to responses synthesized by an auto-fix function.
pub const AUTO_FIX_HEADER: &str = "x-timecache-auto-fixed";

// == Http Response ==
/// A response as produced by the transport.
///
/// The cache treats `data` as an opaque payload; it is never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lower-cased by the transport
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Decoded response body
    pub data: Value,
    /// True when this response was synthesized by an auto-fix function
    #[serde(default)]
    pub auto_fixed: bool,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            data,
            auto_fixed: false,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }

    /// Wraps a substitute value produced by an auto-fix function.
    pub fn substituted(data: Value) -> Self {
        let mut response = Self::ok(data).with_header(AUTO_FIX_HEADER, "true");
        response.auto_fixed = true;
        response
    }

    /// Adds a header, returning the updated response.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substituted_is_marked() {
        let response = HttpResponse::substituted(json!({"fallback": true}));
        assert_eq!(response.status, 200);
        assert!(response.auto_fixed);
        assert_eq!(response.headers.get(AUTO_FIX_HEADER).map(String::as_str), Some("true"));
    }

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::ok(Value::Null).is_success());
        assert!(HttpResponse::new(204, Value::Null).is_success());
        assert!(!HttpResponse::new(404, Value::Null).is_success());
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let response: HttpResponse = serde_json::from_str(r#"{"status":200,"data":[1,2]}"#).unwrap();
        assert!(response.headers.is_empty());
        assert!(!response.auto_fixed);
        assert_eq!(response.data, json!([1, 2]));
    }
}
