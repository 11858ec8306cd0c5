use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;

use crate::webserver::state::AppState;

pub mod status;
pub mod topics;

/// Headroom for JSON escaping of a maximum-size document
const BODY_LIMIT_FACTOR: usize = 6;
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .topics
        .max_content_bytes
        .saturating_mul(BODY_LIMIT_FACTOR)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .merge(status::routes())
        .merge(topics::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
