use axum::{extract::State, response::Response, routing::get, Router};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    logger::{self, LogTag},
    webserver::{
        models::responses::{EndpointsInfo, HealthResponse, ServerInfoResponse},
        state::AppState,
        utils::success_response,
    },
};

/// Create status routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(server_info))
        .route("/health", get(health_check))
}

/// GET /
async fn server_info(State(state): State<Arc<AppState>>) -> Response {
    let server = &state.config.server;
    let response = ServerInfoResponse {
        message: "livemark live presentation server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointsInfo {
            create_topic: "POST /topics".to_string(),
            get_topic: "GET /topics/:topicId".to_string(),
            update_topic: "POST /topics/:topicId?secret=<secret>".to_string(),
            websocket: format!(
                "ws://{}:{}/topics/:topicId[?secret=<secret>]",
                server.host, server.port
            ),
            health: "GET /health".to_string(),
        },
    };

    success_response(response)
}

/// GET /health
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, "Health check endpoint called");
    }

    let hub = state.hub.metrics();
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_connections: hub.active_subscriptions,
        uptime_seconds: state.uptime_seconds(),
        storage_backend: state.directory.store().backend_name().to_string(),
        hub,
    };

    success_response(response)
}
