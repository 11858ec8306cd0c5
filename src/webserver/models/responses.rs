/// API response type definitions
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::topics::Topic;
use crate::topics::models::format_timestamp;
use crate::webserver::ws::metrics::HubMetricsSnapshot;

// ================================================================================================
// Topics
// ================================================================================================

/// POST /topics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicResponse {
    pub topic_id: String,
    pub secret: String,
    pub sub_path: String,
    pub pub_path: String,
}

impl CreateTopicResponse {
    pub fn new(topic_id: String, secret: String) -> Self {
        Self {
            sub_path: format!("/topics/{}", topic_id),
            pub_path: format!("/topics/{}?secret={}", topic_id, secret),
            topic_id,
            secret,
        }
    }
}

/// GET /topics/:topic_id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicContentResponse {
    pub markdown: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Topic> for TopicContentResponse {
    fn from(topic: Topic) -> Self {
        Self {
            created_at: format_timestamp(&topic.created_at),
            updated_at: format_timestamp(&topic.updated_at),
            markdown: topic.markdown,
        }
    }
}

/// POST /topics/:topic_id request body
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContentRequest {
    pub markdown: String,
}

/// POST /topics/:topic_id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    pub updated_at: String,
}

// ================================================================================================
// Status
// ================================================================================================

/// GET /health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub active_connections: usize,
    pub uptime_seconds: u64,
    pub storage_backend: String,
    pub hub: HubMetricsSnapshot,
}

/// GET /
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfoResponse {
    pub message: String,
    pub version: String,
    pub endpoints: EndpointsInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsInfo {
    pub create_topic: String,
    pub get_topic: String,
    pub update_topic: String,
    pub websocket: String,
    pub health: String,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
