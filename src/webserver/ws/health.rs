/// WebSocket health monitoring
///
/// Tracks client activity so the connection loop can ping quiet clients
/// and close ones that stopped answering.
use std::time::{Duration, Instant};

use crate::config::WebsocketConfig;

/// How long a ping may go unanswered
const PONG_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// HEALTH CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Inactivity before the server sends a ping
    pub heartbeat_interval: Duration,

    /// Inactivity after which the connection is closed
    pub idle_timeout: Duration,

    /// Grace period for a pong after a ping
    pub pong_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self::from_config(&WebsocketConfig::default())
    }
}

impl HealthConfig {
    pub fn from_config(config: &WebsocketConfig) -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(config.heartbeat_secs.max(1)),
            idle_timeout: Duration::from_secs(config.client_idle_timeout_secs.max(1)),
            pong_timeout: Duration::from_secs(PONG_TIMEOUT_SECS),
        }
    }

    /// Cadence of the connection loop's health check
    pub fn check_interval(&self) -> Duration {
        self.heartbeat_interval.min(Duration::from_secs(1))
    }
}

// ============================================================================
// CONNECTION HEALTH TRACKER
// ============================================================================

#[derive(Debug)]
pub struct ConnectionHealth {
    /// Last client activity (any frame received)
    last_activity: Instant,

    /// Outstanding ping, if any
    last_ping: Option<Instant>,

    config: HealthConfig,
}

/// What the connection loop should do after a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAction {
    Nothing,
    SendPing,
    Close,
}

impl ConnectionHealth {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            last_activity: Instant::now(),
            last_ping: None,
            config,
        }
    }

    /// Any inbound frame counts, pongs included
    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
        self.last_ping = None;
    }

    pub fn record_ping(&mut self) {
        self.last_ping = Some(Instant::now());
    }

    pub fn is_idle(&self) -> bool {
        self.last_activity.elapsed() > self.config.idle_timeout
    }

    pub fn is_pong_overdue(&self) -> bool {
        self.last_ping
            .map(|ping_time| ping_time.elapsed() > self.config.pong_timeout)
            .unwrap_or(false)
    }

    pub fn needs_ping(&self) -> bool {
        self.last_activity.elapsed() > self.config.heartbeat_interval && self.last_ping.is_none()
    }

    pub fn seconds_since_activity(&self) -> u64 {
        self.last_activity.elapsed().as_secs()
    }

    pub fn check(&self) -> HealthAction {
        if self.is_idle() || self.is_pong_overdue() {
            HealthAction::Close
        } else if self.needs_ping() {
            HealthAction::SendPing
        } else {
            HealthAction::Nothing
        }
    }
}
