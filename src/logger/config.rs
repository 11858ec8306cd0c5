/// Logger configuration derived from command-line flags
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are suppressed
    pub min_level: LogLevel,

    /// Tags with --debug-<tag> enabled
    pub debug_tags: HashSet<String>,

    /// Tags with --verbose-<tag> enabled
    pub verbose_tags: HashSet<String>,

    /// If non-empty, only these tags are shown (besides errors)
    pub enabled_tags: HashSet<String>,

    /// Disable ANSI colors (for piped output)
    pub no_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            no_color: false,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Get a copy of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Mutate the logger configuration in place
pub fn update_logger_config<F: FnOnce(&mut LoggerConfig)>(f: F) {
    f(&mut LOGGER_CONFIG.write());
}

/// Build the configuration from command-line arguments
///
/// Recognized flags:
/// - `--quiet`: warnings and errors only
/// - `--verbose`: everything
/// - `--log-level <level>`: explicit minimum level
/// - `--debug-<tag>` / `--verbose-<tag>`: per-tag detail
/// - `--debug-all`: debug output for every tag
/// - `--no-color`
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if arguments::has_arg("--quiet") {
        config.min_level = LogLevel::Warning;
    }
    if arguments::has_arg("--verbose") {
        config.min_level = LogLevel::Verbose;
    }
    if let Some(level) = arguments::get_arg_value("--log-level").and_then(|v| LogLevel::parse(&v))
    {
        config.min_level = level;
    }

    let debug_all = arguments::has_arg("--debug-all");
    for tag in LogTag::all() {
        let key = tag.to_debug_key();
        if debug_all || arguments::has_arg(&format!("--debug-{}", key)) {
            config.debug_tags.insert(key.clone());
        }
        if arguments::has_arg(&format!("--verbose-{}", key)) {
            config.verbose_tags.insert(key);
        }
    }

    // Debug output for any tag needs the level threshold to let it through
    if !config.debug_tags.is_empty() && config.min_level < LogLevel::Debug {
        config.min_level = LogLevel::Debug;
    }

    config.no_color = arguments::has_arg("--no-color");

    set_logger_config(config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
