/// Configuration schema definitions
///
/// Every section is declared with `config_struct!`, so a config file only
/// needs the keys it wants to change.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config_struct;

/// Which content store backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Memory,
    Sqlite,
}

config_struct! {
    /// HTTP listener settings
    pub struct ServerConfig {
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8000,
    }
}

config_struct! {
    /// Capability signing settings
    pub struct SecurityConfig {
        /// base64url HMAC key; empty means a random key per process run
        hmac_key: String = String::new(),
    }
}

config_struct! {
    pub struct StorageConfig {
        backend: StorageBackendKind = StorageBackendKind::Sqlite,
        database_path: String = "data/livemark.db".to_string(),
        /// Interval of the expired-record sweeper (0 disables it)
        sweep_interval_secs: u64 = 300,
    }
}

config_struct! {
    pub struct TopicsConfig {
        ttl_days: u64 = 30,
        max_content_bytes: usize = 1_048_576,
    }
}

config_struct! {
    pub struct WebsocketConfig {
        /// Per-connection outbound queue depth before messages are dropped
        client_buffer_size: usize = 256,
        heartbeat_secs: u64 = 30,
        client_idle_timeout_secs: u64 = 90,
    }
}

config_struct! {
    /// Root configuration
    pub struct Config {
        server: ServerConfig = ServerConfig::default(),
        security: SecurityConfig = SecurityConfig::default(),
        storage: StorageConfig = StorageConfig::default(),
        topics: TopicsConfig = TopicsConfig::default(),
        websocket: WebsocketConfig = WebsocketConfig::default(),
    }
}

impl TopicsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days.saturating_mul(24 * 60 * 60))
    }
}
