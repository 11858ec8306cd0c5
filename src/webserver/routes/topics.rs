/// Topic endpoints
///
/// - `POST /topics` creates a topic
/// - `GET /topics/:topic_id` reads it, or upgrades to a WebSocket
/// - `POST /topics/:topic_id?secret=...` replaces its document
use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    capability::AccessLevel,
    errors::TopicError,
    logger::{self, LogTag},
    topics::{models::format_timestamp, validation::check_topic_id},
    webserver::{
        models::responses::{
            CreateTopicResponse, TopicContentResponse, UpdateContentRequest, UpdateResponse,
        },
        state::AppState,
        utils::{created_response, error_response, success_response, topic_error_response},
        ws::{connection::handle_connection, ConnectionContext, OutboundMessage},
    },
};

/// `?secret=...`; absent means read-only
#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    #[serde(default)]
    pub secret: Option<String>,
}

impl AccessQuery {
    fn secret(&self) -> &str {
        self.secret.as_deref().unwrap_or("")
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/topics", post(create_topic))
        .route("/topics/:topic_id", get(get_topic).post(update_topic))
}

/// POST /topics
async fn create_topic(State(state): State<Arc<AppState>>) -> Response {
    match state.directory.create_topic().await {
        Ok(pair) => success_response(CreateTopicResponse::new(pair.topic_id, pair.secret)),
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("Topic creation failed: {}", e),
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create topic",
                Some(e.code()),
            )
        }
    }
}

/// GET /topics/:topic_id, with or without a WebSocket upgrade
async fn get_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    Query(query): Query<AccessQuery>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    if let Err(e) = check_topic_id(&topic_id) {
        return topic_error_response(&e);
    }

    if let Some(ws) = ws {
        return upgrade_topic(state, topic_id, query.secret(), ws).await;
    }

    match state.directory.get_topic(&topic_id).await {
        Ok(Some(topic)) => success_response(TopicContentResponse::from(topic)),
        Ok(None) => topic_error_response(&TopicError::NotFound),
        Err(e) => topic_error_response(&e),
    }
}

/// Upgrade checks: the topic must exist and a supplied secret must verify
async fn upgrade_topic(
    state: Arc<AppState>,
    topic_id: String,
    secret: &str,
    ws: WebSocketUpgrade,
) -> Response {
    match state.directory.topic_exists(&topic_id).await {
        Ok(true) => {}
        Ok(false) => return topic_error_response(&TopicError::NotFound),
        Err(e) => return topic_error_response(&e),
    }

    let access = state.directory.verify_access(&topic_id, secret);
    if access == AccessLevel::Invalid {
        logger::warning(
            LogTag::Security,
            &format!("Rejected WebSocket upgrade with invalid secret for topic {}", topic_id),
        );
        return topic_error_response(&TopicError::Forbidden);
    }

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("Upgrading topic {} (access={})", topic_id, access),
        );
    }

    let ctx = ConnectionContext { topic_id, access };
    ws.on_upgrade(move |socket| handle_connection(socket, state, ctx))
}

/// POST /topics/:topic_id
///
/// Checked in order: id shape (400), write access (403, before the body is
/// looked at), body schema (400), size (413), existence (404).
async fn update_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    Query(query): Query<AccessQuery>,
    body: Bytes,
) -> Response {
    if let Err(e) = check_topic_id(&topic_id) {
        return topic_error_response(&e);
    }

    if !state
        .directory
        .verify_access(&topic_id, query.secret())
        .is_writable()
    {
        return topic_error_response(&TopicError::Forbidden);
    }

    let request: UpdateContentRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            if is_debug_webserver_enabled() {
                logger::debug(
                    LogTag::Webserver,
                    &format!("Topic {}: invalid update body: {}", topic_id, e),
                );
            }
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request body: expected {\"markdown\": string}",
                Some("INVALID_FORMAT"),
            );
        }
    };

    match state
        .directory
        .update_content(&topic_id, &request.markdown)
        .await
    {
        Ok(topic) => {
            state
                .hub
                .broadcast(&topic_id, &OutboundMessage::content(request.markdown));
            created_response(UpdateResponse {
                success: true,
                updated_at: format_timestamp(&topic.updated_at),
            })
        }
        Err(e) => topic_error_response(&e),
    }
}
