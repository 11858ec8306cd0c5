/// Server orchestration
///
/// Wires configuration, capability codec, content store, topic directory and
/// broadcast hub together, then serves until a shutdown signal arrives.
use std::sync::Arc;

use crate::{
    arguments::get_port_override,
    capability::CapabilityCodec,
    config::{self, Config},
    logger::{self, LogTag},
    storage::{open_store, spawn_sweeper},
    topics::TopicDirectory,
    webserver::{self, ws::TopicHub, AppState},
};

/// Build the shared state from a configuration
pub fn build_state(config: Config) -> Result<Arc<AppState>, String> {
    let codec = Arc::new(CapabilityCodec::from_config(&config.security));

    let store = open_store(&config.storage)
        .map_err(|e| format!("Failed to open content store: {}", e))?;
    spawn_sweeper(Arc::clone(&store), config.storage.sweep_interval_secs);

    let directory = Arc::new(TopicDirectory::new(store, codec, &config.topics));
    let hub = Arc::new(TopicHub::new(config.websocket.client_buffer_size));

    Ok(Arc::new(AppState::new(config, directory, hub)))
}

/// Run the server until shutdown
pub async fn run_server() -> Result<(), String> {
    let mut config = config::get_config_clone();
    if let Some(port) = get_port_override() {
        config.server.port = port;
    }

    logger::info(
        LogTag::System,
        &format!(
            "Starting livemark v{} (storage={:?}, ttl={}d, max content={} bytes)",
            env!("CARGO_PKG_VERSION"),
            config.storage.backend,
            config.topics.ttl_days,
            config.topics.max_content_bytes
        ),
    );

    let state = build_state(config)?;

    let mut server = tokio::spawn(webserver::start_server(Arc::clone(&state)));

    // The server can also stop on its own (bind failure)
    tokio::select! {
        joined = &mut server => return flatten(joined),
        result = wait_for_shutdown_signal() => {
            result?;
            webserver::shutdown();
        }
    }

    flatten(server.await)
}

fn flatten(
    joined: Result<Result<(), String>, tokio::task::JoinError>,
) -> Result<(), String> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(format!("Webserver task failed: {}", e)),
    }
}

/// Wait for Ctrl+C (and SIGTERM on Unix)
async fn wait_for_shutdown_signal() -> Result<(), String> {
    #[cfg(unix)]
    let signal_name = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| format!("Failed to bind SIGINT: {}", e))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| format!("Failed to bind SIGTERM: {}", e))?;

        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    #[cfg(not(unix))]
    let signal_name = {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| format!("Failed to listen for shutdown signal: {}", e))?;
        "CTRL_C"
    };

    logger::warning(
        LogTag::System,
        &format!(
            "Shutdown signal received ({}). Press Ctrl+C again to force kill.",
            signal_name
        ),
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::error(LogTag::System, "Second Ctrl+C detected, forcing exit.");
            // 130 is the conventional exit code for SIGINT
            std::process::exit(130);
        }
    });

    Ok(())
}
