/// Topic directory - business logic for topic management
///
/// Combines the capability codec with the content store: creates topics,
/// reads and updates their document, and enforces the id shape and size
/// bound before any storage work happens.
use std::sync::Arc;
use std::time::Duration;

use super::models::{self, StoredTopic, Topic};
use super::validation::{check_content_size, check_topic_id};
use crate::capability::{AccessLevel, CapabilityCodec, TopicPair};
use crate::config::TopicsConfig;
use crate::errors::{TopicError, TopicResult};
use crate::logger::{self, LogTag};
use crate::storage::{ContentStore, StoreKey};

pub struct TopicDirectory {
    store: Arc<dyn ContentStore>,
    codec: Arc<CapabilityCodec>,
    ttl: Duration,
    max_content_bytes: usize,
}

impl TopicDirectory {
    pub fn new(
        store: Arc<dyn ContentStore>,
        codec: Arc<CapabilityCodec>,
        config: &TopicsConfig,
    ) -> Self {
        Self {
            store,
            codec,
            ttl: config.ttl(),
            max_content_bytes: config.max_content_bytes,
        }
    }

    fn key(topic_id: &str) -> StoreKey {
        StoreKey::new(["topic", topic_id])
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn codec(&self) -> &CapabilityCodec {
        &self.codec
    }

    /// Create an empty topic and return its id and secret
    ///
    /// The secret is not kept anywhere; the caller hands it to the presenter.
    pub async fn create_topic(&self) -> TopicResult<TopicPair> {
        let pair = self.codec.generate_topic();
        let record = StoredTopic::new_empty(models::now());

        self.store
            .set(
                &Self::key(&pair.topic_id),
                serde_json::to_value(&record).map_err(|e| TopicError::Internal(e.to_string()))?,
                Some(self.ttl),
            )
            .await?;

        logger::info(
            LogTag::Topics,
            &format!("Topic created: {}", pair.topic_id),
        );
        Ok(pair)
    }

    /// Read a topic; `None` when absent or expired
    pub async fn get_topic(&self, topic_id: &str) -> TopicResult<Option<Topic>> {
        check_topic_id(topic_id)?;

        match self.store.get(&Self::key(topic_id)).await? {
            Some(value) => {
                let record: StoredTopic = serde_json::from_value(value).map_err(|e| {
                    logger::error(
                        LogTag::Topics,
                        &format!("Corrupt record for topic {}: {}", topic_id, e),
                    );
                    TopicError::Internal(format!("corrupt topic record: {}", e))
                })?;
                Ok(Some(record.into_topic(topic_id)?))
            }
            None => Ok(None),
        }
    }

    /// Replace a topic's document
    ///
    /// Keeps `createdAt`, refreshes `updatedAt` and restarts the TTL window.
    /// Concurrent writers are last-write-wins.
    pub async fn update_content(&self, topic_id: &str, markdown: &str) -> TopicResult<Topic> {
        check_topic_id(topic_id)?;
        check_content_size(markdown, self.max_content_bytes)?;

        let key = Self::key(topic_id);
        let existing: StoredTopic = match self.store.get(&key).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| TopicError::Internal(format!("corrupt topic record: {}", e)))?,
            None => return Err(TopicError::NotFound),
        };

        let record = StoredTopic {
            markdown: markdown.to_string(),
            created_at: existing.created_at,
            updated_at: models::format_timestamp(&models::now()),
        };
        let value =
            serde_json::to_value(&record).map_err(|e| TopicError::Internal(e.to_string()))?;
        self.store.set(&key, value, Some(self.ttl)).await?;

        logger::debug(
            LogTag::Topics,
            &format!(
                "Topic {} updated ({} bytes)",
                topic_id,
                record.markdown.len()
            ),
        );
        record.into_topic(topic_id)
    }

    /// Existence probe without decoding the record
    pub async fn topic_exists(&self, topic_id: &str) -> TopicResult<bool> {
        check_topic_id(topic_id)?;
        Ok(self.store.has(&Self::key(topic_id)).await?)
    }

    /// Access level of a request; malformed ids are always `Invalid`
    pub fn verify_access(&self, topic_id: &str, secret: &str) -> AccessLevel {
        if check_topic_id(topic_id).is_err() {
            return AccessLevel::Invalid;
        }
        self.codec.verify_access(topic_id, secret)
    }
}
