/// Topic data models
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{TopicError, TopicResult};

/// A live document as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub topic_id: String,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted record under `["topic", topicId]`
///
/// Timestamps are RFC 3339 strings with millisecond precision so the stored
/// form is independent of the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTopic {
    pub markdown: String,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredTopic {
    /// Fresh, empty record
    pub fn new_empty(now: DateTime<Utc>) -> Self {
        let stamp = format_timestamp(&now);
        Self {
            markdown: String::new(),
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    pub fn into_topic(self, topic_id: &str) -> TopicResult<Topic> {
        Ok(Topic {
            topic_id: topic_id.to_string(),
            markdown: self.markdown,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Current time truncated to what the stored format keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> TopicResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| TopicError::Internal(format!("corrupt timestamp '{}': {}", value, e)))
}
