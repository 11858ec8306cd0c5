/// SQLite-backed content store
///
/// One `kv_entries` table keyed by the encoded store key. Expiry is an
/// absolute unix-millisecond timestamp; reads filter expired rows and the
/// sweeper deletes them. All queries run on tokio's blocking pool.
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{ContentStore, StoreKey};
use crate::arguments::is_debug_storage_enabled;
use crate::errors::{StoreError, StoreResult};
use crate::logger::{self, LogTag};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        logger::debug(
            LogTag::Storage,
            &format!("Opened SQLite store at {}", path.display()),
        );
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and throwaway runs
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_kv_entries_expires ON kv_entries(expires_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn set(&self, key: &StoreKey, value: Value, ttl: Option<Duration>) -> StoreResult<()> {
        let key = key.encoded();
        let text = serde_json::to_string(&value)?;
        let expires_at = ttl.map(|ttl| {
            now_millis().saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
        });

        if is_debug_storage_enabled() {
            logger::debug(
                LogTag::Storage,
                &format!("SET {} ({} bytes, expires_at={:?})", key, text.len(), expires_at),
            );
        }

        self.run(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, text, expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Value>> {
        let key = key.encoded();

        let text: Option<String> = self
            .run(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT value FROM kv_entries
                         WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                        params![key, now_millis()],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        let key = key.encoded();
        self.run(move |conn| {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn has(&self, key: &StoreKey) -> StoreResult<bool> {
        let key = key.encoded();
        self.run(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM kv_entries
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![key, now_millis()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        self.run(|conn| {
            let removed = conn.execute(
                "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now_millis()],
            )?;
            Ok(removed)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
