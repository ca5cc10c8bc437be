//! Storage Module
//!
//! Optional external key-value store used to preload and save serialized
//! cache entries. Never consulted on the read path.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

/// A string key-value store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>>;
}

// == Memory Backend ==
/// In-process backend, mostly useful for tests and warm restarts within a
/// single process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.values.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        backend.set("b", "2".into()).await.unwrap();
        backend.set("a", "1".into()).await.unwrap();

        assert_eq!(backend.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(backend.get("missing").await.unwrap(), None);
        assert_eq!(backend.keys().await.unwrap(), vec!["a", "b"]);
        assert_eq!(backend.len(), 2);
    }
}
