/// Configuration utilities - loading and access helpers
///
/// - Loading configuration from disk
/// - Environment overrides
/// - Thread-safe access helpers
use once_cell::sync::OnceCell;
use std::sync::RwLock;

use super::schemas::Config;
use crate::logger::{self, LogTag};

/// Global configuration instance
///
/// Set once at startup by `load_config`; the webserver copies what it needs
/// into its state, so tests can run without touching this.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// A missing file yields defaults with a warning. Environment overrides are
/// applied on top in both cases.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let mut config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        parse_config(&contents).map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    apply_env_overrides(&mut config);

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    logger::debug(LogTag::Config, &format!("Configuration loaded from {}", path));
    Ok(())
}

/// Parse a TOML document into a Config
pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(contents)
}

/// Apply HMAC_KEY / HOST / PORT environment variables
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var("HMAC_KEY") {
        if !key.is_empty() {
            config.security.hmac_key = key;
        }
    }
    if let Ok(host) = std::env::var("HOST") {
        if !host.is_empty() {
            config.server.host = host;
        }
    }
    if let Ok(port) = std::env::var("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => logger::warning(
                LogTag::Config,
                &format!("Ignoring invalid PORT value '{}'", port),
            ),
        }
    }
}

/// Run a closure with read access to the global config
///
/// Falls back to defaults if the config was never loaded.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get().and_then(|lock| lock.read().ok()) {
        Some(guard) => f(&guard),
        None => f(&Config::default()),
    }
}

/// Clone of the current global config
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackendKind;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [server]
            port = 9100

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.topics.ttl_days, 30);
        assert_eq!(config.topics.max_content_bytes, 1_048_576);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(parse_config("[storage]\nbackend = \"redis\"\n").is_err());
    }

    #[test]
    fn test_ttl_duration() {
        let config = Config::default();
        assert_eq!(config.topics.ttl().as_secs(), 30 * 24 * 60 * 60);

        let huge = parse_config(&format!("[topics]\nttl_days = {}\n", i64::MAX)).unwrap();
        assert_eq!(huge.topics.ttl().as_secs(), u64::MAX);
    }
}
