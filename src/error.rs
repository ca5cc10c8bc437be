//! Error types for the cache client
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::models::HttpResponse;

// == Cache Error Enum ==
/// Unified error type for the cache client.
///
/// The enum is `Clone` because a single deduplicated network outcome is
/// delivered to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The transport failed or answered with a non-success status
    #[error("Transport error: {message}")]
    Transport {
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        /// Human readable failure description
        message: String,
        /// The failing response, when one was received
        response: Option<Box<HttpResponse>>,
    },

    /// Time travel requested but disabled, or no snapshots exist for the URL
    #[error("No history available for {0}")]
    NoHistory(String),

    /// The requested time travel instant could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The request was cancelled or timed out before completion
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// Rejected configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// An entry could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    // == Constructors ==
    /// Creates a transport error without status or response.
    pub fn transport(message: impl Into<String>) -> Self {
        CacheError::Transport {
            status: None,
            message: message.into(),
            response: None,
        }
    }

    /// Creates a transport error from a non-success response.
    pub fn from_response(response: HttpResponse) -> Self {
        CacheError::Transport {
            status: Some(response.status),
            message: format!("request failed with status {}", response.status),
            response: Some(Box::new(response)),
        }
    }

    /// Returns true for cancellation and timeout outcomes.
    pub fn is_aborted(&self) -> bool {
        matches!(self, CacheError::Aborted(_))
    }

    /// Returns the HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CacheError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache client.
pub type Result<T> = std::result::Result<T, CacheError>;
