/// Topic broadcast hub
///
/// Per-topic publish/subscribe relay, independent of persistence. Each
/// subscriber owns a bounded queue; broadcasting never waits on a slow
/// subscriber, it drops the message for that subscriber instead.
///
/// `Broadcaster` is the seam the connection handler and routes depend on,
/// so an out-of-process pub/sub backend can stand in for `TopicHub`.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

use crate::{
    arguments::is_debug_websocket_enabled,
    logger::{self, LogTag},
};

use super::message::OutboundMessage;
use super::metrics::{HubMetrics, HubMetricsSnapshot};

// ============================================================================
// HUB TYPES
// ============================================================================

/// Subscriber id (unique per hub)
pub type SubscriberId = u64;

/// Serialized outbound frame, shared by every recipient of one broadcast
pub type Frame = Arc<str>;

type SubscriberSender = mpsc::Sender<Frame>;

/// Publish/subscribe by topic
pub trait Broadcaster: Send + Sync {
    /// Register a subscriber for a topic
    fn subscribe(&self, topic_id: &str) -> Subscription;

    /// Enqueue a message for every current subscriber; returns deliveries
    fn broadcast(&self, topic_id: &str, message: &OutboundMessage) -> usize;

    fn subscriber_count(&self, topic_id: &str) -> usize;

    fn metrics(&self) -> HubMetricsSnapshot;
}

// ============================================================================
// SUBSCRIPTION
// ============================================================================

/// One subscriber's queue plus the action that removes it from the hub
///
/// The release action runs exactly once: on `unsubscribe()` or on drop,
/// whichever comes first.
pub struct Subscription {
    topic_id: String,
    id: SubscriberId,
    receiver: mpsc::Receiver<Frame>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(
        topic_id: impl Into<String>,
        id: SubscriberId,
        receiver: mpsc::Receiver<Frame>,
        release: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            topic_id: topic_id.into(),
            id,
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// Next frame; `None` once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Leave the hub; after this returns nothing more is enqueued
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            self.receiver.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic_id", &self.topic_id)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// TOPIC HUB
// ============================================================================

struct HubInner {
    /// topic id → (subscriber id → queue)
    topics: RwLock<HashMap<String, HashMap<SubscriberId, SubscriberSender>>>,

    next_id: AtomicU64,

    metrics: Arc<HubMetrics>,

    /// Per-subscriber queue depth (from config)
    buffer_size: usize,
}

impl HubInner {
    fn remove(&self, topic_id: &str, id: SubscriberId) {
        let mut topics = self.topics.write();
        let removed = match topics.get_mut(topic_id) {
            Some(subscribers) => {
                let removed = subscribers.remove(&id).is_some();
                // Reclaim the channel once its last subscriber leaves
                if subscribers.is_empty() {
                    topics.remove(topic_id);
                }
                removed
            }
            None => false,
        };
        drop(topics);

        if removed {
            self.metrics.subscription_closed();
            if is_debug_websocket_enabled() {
                logger::debug(
                    LogTag::Websocket,
                    &format!("Hub: subscriber {} left topic {}", id, topic_id),
                );
            }
        }
    }
}

/// In-process hub
#[derive(Clone)]
pub struct TopicHub {
    inner: Arc<HubInner>,
}

impl TopicHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                topics: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                metrics: HubMetrics::new(),
                buffer_size: buffer_size.max(1),
            }),
        }
    }

    /// Topics that currently have at least one subscriber
    pub fn topic_count(&self) -> usize {
        self.inner.topics.read().len()
    }
}

impl Broadcaster for TopicHub {
    fn subscribe(&self, topic_id: &str) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.inner.buffer_size);

        self.inner
            .topics
            .write()
            .entry(topic_id.to_string())
            .or_default()
            .insert(id, tx);
        self.inner.metrics.subscription_opened();

        if is_debug_websocket_enabled() {
            logger::debug(
                LogTag::Websocket,
                &format!(
                    "Hub: subscriber {} joined topic {} (topic subscribers={})",
                    id,
                    topic_id,
                    self.subscriber_count(topic_id)
                ),
            );
        }

        // Weak: a subscription outliving the hub must not keep it alive
        let hub: Weak<HubInner> = Arc::downgrade(&self.inner);
        let topic = topic_id.to_string();
        Subscription::new(topic_id, id, rx, move || {
            if let Some(hub) = hub.upgrade() {
                hub.remove(&topic, id);
            }
        })
    }

    fn broadcast(&self, topic_id: &str, message: &OutboundMessage) -> usize {
        let frame: Frame = match message.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                logger::error(
                    LogTag::Websocket,
                    &format!("Hub: failed to serialize message: {}", e),
                );
                return 0;
            }
        };

        let topics = self.inner.topics.read();
        let subscribers = match topics.get(topic_id) {
            Some(subscribers) => subscribers,
            None => return 0,
        };

        let mut sent = 0usize;
        let mut dropped = 0u64;

        for (id, sender) in subscribers.iter() {
            match sender.try_send(Arc::clone(&frame)) {
                Ok(()) => sent += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    if is_debug_websocket_enabled() {
                        logger::debug(
                            LogTag::Websocket,
                            &format!("Hub: message dropped for subscriber {} (queue full)", id),
                        );
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver already gone; its release action cleans up
                }
            }
        }
        drop(topics);

        self.inner.metrics.message_delivered(sent as u64);
        if dropped > 0 {
            self.inner.metrics.message_dropped(dropped);
        }

        if is_debug_websocket_enabled() {
            logger::debug(
                LogTag::Websocket,
                &format!(
                    "Hub: broadcast to topic {} (sent={}, dropped={})",
                    topic_id, sent, dropped
                ),
            );
        }

        sent
    }

    fn subscriber_count(&self, topic_id: &str) -> usize {
        self.inner
            .topics
            .read()
            .get(topic_id)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    fn metrics(&self) -> HubMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}
