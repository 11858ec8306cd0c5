// In-memory content store with lazy TTL expiry.
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{ContentStore, StoreKey};
use crate::errors::StoreResult;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// Process-local store; contents vanish on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<StoreKey, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn set(&self, key: &StoreKey, value: Value, ttl: Option<Duration>) -> StoreResult<()> {
        // Compute expiry once so reads only compare Instants; an unrepresentable
        // deadline means the entry never expires
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.inner
            .write()
            .insert(key.clone(), Entry { value, expires_at });
        Ok(())
    }

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Value>> {
        let now = Instant::now();
        {
            let guard = self.inner.read();
            match guard.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case of a racing set
        let mut guard = self.inner.write();
        if guard.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            guard.remove(key);
        }
        Ok(None)
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        self.inner.write().remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|_, entry| !entry.is_expired(now));
        Ok(before - guard.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
