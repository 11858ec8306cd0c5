/// Centralized argument handling for livemark
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Debug flag checking functions per subsystem
/// - Help text
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Webserver debug mode
pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver") || has_arg("--debug-all")
}

/// WebSocket connection debug mode
pub fn is_debug_websocket_enabled() -> bool {
    has_arg("--debug-websocket") || has_arg("--debug-all")
}

/// Storage backend debug mode
pub fn is_debug_storage_enabled() -> bool {
    has_arg("--debug-storage") || has_arg("--debug-all")
}

// =============================================================================
// MODE / VALUE ACCESSORS
// =============================================================================

/// Config file path override (--config <path>)
pub fn get_config_path() -> Option<String> {
    get_arg_value("--config")
}

/// Port override (--port <port>)
pub fn get_port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|v| v.parse().ok())
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Print usage information
pub fn print_help() {
    println!("livemark - live markdown presentation server");
    println!();
    println!("USAGE:");
    println!("    livemark [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>       Config file (default: data/config.toml)");
    println!("    --port <port>         Override the listen port");
    println!("    --quiet               Only warnings and errors");
    println!("    --verbose             Everything, including verbose traces");
    println!("    --log-level <level>   error | warning | info | debug | verbose");
    println!("    --no-color            Plain log output");
    println!("    -h, --help            Show this help");
    println!();
    println!("DEBUG FLAGS:");
    println!("    --debug-all           Debug output for every subsystem");
    println!("    --debug-webserver     HTTP routing");
    println!("    --debug-websocket     WebSocket connections and hub");
    println!("    --debug-storage       Content store");
    println!("    --debug-security      Capability verification");
    println!("    --debug-topics        Topic directory");
    println!("    --debug-config        Configuration loading");
    println!();
    println!("ENVIRONMENT:");
    println!("    HMAC_KEY              base64url signing key (random per run if unset)");
    println!("    HOST, PORT            Listen address overrides");
}
