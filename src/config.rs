//! Configuration system
//!
//! TOML file with embedded defaults (see `schemas`), loaded once at startup
//! into a global, plus environment overrides for deployment secrets.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    Config, SecurityConfig, ServerConfig, StorageBackendKind, StorageConfig, TopicsConfig,
    WebsocketConfig,
};
pub use utils::{
    apply_env_overrides, get_config_clone, load_config, load_config_from_path, parse_config,
    with_config, CONFIG_FILE_PATH,
};
