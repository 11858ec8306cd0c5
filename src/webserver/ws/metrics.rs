/// WebSocket metrics collection
///
/// Hub-wide counters surface through `/health`; per-connection counters are
/// logged when a connection closes.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// CONNECTION METRICS
// ============================================================================

/// Per-connection counters
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    /// Frames written to the client (broadcasts, initial content, errors)
    frames_sent: AtomicU64,

    /// Text frames read from the client
    frames_received: AtomicU64,

    /// Error frames written to the client
    errors_sent: AtomicU64,
}

impl ConnectionMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_errors(&self) {
        self.errors_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnectionMetricsSnapshot {
        ConnectionMetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            errors_sent: self.errors_sent.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionMetricsSnapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub errors_sent: u64,
}

// ============================================================================
// HUB METRICS
// ============================================================================

/// Hub-level metrics (aggregate across all topics)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Subscriptions ever opened
    total_subscriptions: AtomicU64,

    /// Subscriptions currently open
    active_subscriptions: AtomicUsize,

    /// Messages enqueued for a subscriber
    messages_delivered: AtomicU64,

    /// Messages dropped because a subscriber queue was full
    messages_dropped: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscription_opened(&self) {
        self.total_subscriptions.fetch_add(1, Ordering::Relaxed);
        self.active_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_closed(&self) {
        // Saturating: a stray double close must not wrap the gauge
        let _ = self
            .active_subscriptions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn message_delivered(&self, count: u64) {
        self.messages_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn message_dropped(&self, count: u64) {
        self.messages_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active_subscriptions.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            total_subscriptions: self.total_subscriptions.load(Ordering::Relaxed),
            active_subscriptions: self.active_subscriptions.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMetricsSnapshot {
    pub total_subscriptions: u64,
    pub active_subscriptions: usize,
    pub messages_delivered: u64,
    pub messages_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_metrics() {
        let metrics = ConnectionMetrics::new();

        metrics.inc_sent();
        metrics.inc_sent();
        metrics.inc_received();
        metrics.inc_errors();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_sent, 2);
        assert_eq!(snapshot.frames_received, 1);
        assert_eq!(snapshot.errors_sent, 1);
    }

    #[test]
    fn test_hub_metrics() {
        let metrics = HubMetrics::new();

        metrics.subscription_opened();
        metrics.subscription_opened();
        metrics.message_delivered(2);
        metrics.message_dropped(3);
        metrics.subscription_closed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_subscriptions, 2);
        assert_eq!(snapshot.active_subscriptions, 1);
        assert_eq!(snapshot.messages_delivered, 2);
        assert_eq!(snapshot.messages_dropped, 3);

        metrics.subscription_closed();
        metrics.subscription_closed();
        assert_eq!(metrics.active_subscriptions(), 0);
    }
}
