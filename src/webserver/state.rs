/// Shared application state for the webserver
///
/// Holds the topic directory and broadcast hub that route handlers and
/// WebSocket connections drive.
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::topics::TopicDirectory;
use crate::webserver::ws::Broadcaster;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration snapshot taken at startup
    pub config: Arc<Config>,

    pub directory: Arc<TopicDirectory>,

    /// Topic broadcast hub
    pub hub: Arc<dyn Broadcaster>,

    /// Server startup time
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, directory: Arc<TopicDirectory>, hub: Arc<dyn Broadcaster>) -> Self {
        Self {
            config: Arc::new(config),
            directory,
            hub,
            startup_time: Utc::now(),
        }
    }

    /// Open WebSocket connections (one hub subscription each)
    pub fn active_connections(&self) -> usize {
        self.hub.metrics().active_subscriptions
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
