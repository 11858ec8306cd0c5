//! Structured logging system for livemark
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via --debug-<tag> flags
//! - Colored console output
//!
//! ## Usage
//!
//! ```rust
//! use livemark::logger::{self, LogTag};
//!
//! logger::error(LogTag::Storage, "Failed to open database");
//! logger::warning(LogTag::Security, "HMAC_KEY not set");
//! logger::info(LogTag::Webserver, "Listening on 127.0.0.1:8000");
//! logger::debug(LogTag::Websocket, "Frame received"); // Only if --debug-websocket
//! ```
//!
//! ## Initialization
//!
//! Call once at startup (in main.rs):
//! ```rust
//! livemark::logger::init();
//! ```

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{
    get_logger_config, init_from_args, set_logger_config, update_logger_config, LoggerConfig,
};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system from command-line arguments
///
/// Without this call every tag logs at Info and above.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
///
/// Warnings are shown by default (also under --quiet).
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics)
///
/// Debug logs are ONLY shown when the --debug-<tag> flag for the tag is given.
///
/// # Example
/// ```rust
/// use livemark::logger::{self, LogTag};
///
/// // Only shown with --debug-storage flag
/// logger::debug(LogTag::Storage, "purged 3 expired entries");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Whether debug output is active for a tag
///
/// Use to skip building expensive debug messages.
pub fn is_debug_enabled(tag: LogTag) -> bool {
    core::should_log(&tag, LogLevel::Debug)
}
