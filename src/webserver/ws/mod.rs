/// Real-time layer: one WebSocket per viewer or presenter, grouped by topic
///
/// - `hub`: per-topic broadcast with bounded per-subscriber queues
/// - `connection`: upgrade lifecycle and inbound frame rules
/// - `message`: sparse inbound/outbound frames and error frames
/// - `health`: heartbeat and idle tracking
/// - `metrics`: hub and per-connection counters
pub mod connection;
pub mod health;
pub mod hub;
pub mod message;
pub mod metrics;

pub use connection::ConnectionContext;
pub use hub::{Broadcaster, Subscription, TopicHub};
pub use message::{ErrorFrame, InboundMessage, OutboundMessage};
