/// Axum webserver implementation
///
/// Server lifecycle: bind, serve, and graceful termination on shutdown.
use axum::Router;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::{
    config::Config,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown flag; flips to `true` once
///
/// Waiters check the current value before awaiting a change, so tasks that
/// start after the signal still see it.
static SHUTDOWN: Lazy<watch::Sender<bool>> = Lazy::new(|| watch::channel(false).0);

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::info(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN.send_replace(true);
}

/// Resolve once shutdown has been triggered, immediately if it already was
pub async fn wait_for_shutdown() {
    let mut rx = SHUTDOWN.subscribe();
    loop {
        let done = *rx.borrow_and_update();
        if done || rx.changed().await.is_err() {
            return;
        }
    }
}

/// Start the webserver
///
/// Blocks until the server is shut down.
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let config: &Config = &state.config;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another livemark instance (or another service) owns this port.\n\
             Pick a different one with --port <n> or PORT=<n>.",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024.",
            addr, config.server.port
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    serve(listener, state).await
}

/// Serve on an already-bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), String> {
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Listener has no local address: {}", e))?;
    let app = build_app(state);

    logger::info(
        LogTag::Webserver,
        &format!("Webserver listening on http://{}", addr),
    );
    logger::info(
        LogTag::Webserver,
        &format!("WebSocket endpoint: ws://{}/topics/:topicId", addr),
    );

    let shutdown_signal = async {
        wait_for_shutdown().await;
        logger::info(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Build the Axum application with all routes and middleware
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state).layer(CorsLayer::permissive())
}
