//! Content store abstraction
//!
//! A key/value interface with per-key expiry. Topic logic only talks to
//! `ContentStore`, so the backing engine can change without touching it.
//!
//! Contract every backend keeps:
//! - `set` overwrites unconditionally
//! - `get` on an absent or expired key is `Ok(None)`, not an error
//! - `delete` on an absent key is a no-op
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{StorageBackendKind, StorageConfig};
use crate::errors::StoreResult;
use crate::logger::{self, LogTag};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Hierarchical key, e.g. `["topic", "<id>"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(Vec<String>);

impl StoreKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Flat, unambiguous encoding for backends with string keys
    ///
    /// Parts are JSON-encoded so separators inside a part cannot collide.
    pub fn encoded(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| self.0.join("/"))
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a value, replacing any previous one; `ttl` of None never expires
    async fn set(&self, key: &StoreKey, value: Value, ttl: Option<Duration>) -> StoreResult<()>;

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Value>>;

    async fn delete(&self, key: &StoreKey) -> StoreResult<()>;

    async fn has(&self, key: &StoreKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Physically remove expired entries, returning how many went away
    async fn purge_expired(&self) -> StoreResult<usize>;

    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected in configuration
pub fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = match config.backend {
        StorageBackendKind::Memory => Arc::new(MemoryStore::new()),
        StorageBackendKind::Sqlite => Arc::new(SqliteStore::open(&config.database_path)?),
    };

    logger::info(
        LogTag::Storage,
        &format!("Content store ready (backend={})", store.backend_name()),
    );
    Ok(store)
}

/// Periodically purge expired entries until the process exits
pub fn spawn_sweeper(store: Arc<dyn ContentStore>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // First tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(count) => logger::debug(
                    LogTag::Storage,
                    &format!("Purged {} expired entries", count),
                ),
                Err(e) => logger::error(
                    LogTag::Storage,
                    &format!("Expired entry sweep failed: {}", e),
                ),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding() {
        let key = StoreKey::new(["topic", "abc"]);
        assert_eq!(key.parts(), &["topic".to_string(), "abc".to_string()]);
        assert_eq!(key.to_string(), "topic/abc");
        assert_ne!(
            StoreKey::new(["a/b", "c"]).encoded(),
            StoreKey::new(["a", "b/c"]).encoded()
        );
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackendKind::Memory,
            ..StorageConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
