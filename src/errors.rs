//! Error types shared across the topic core
//!
//! `StoreError` is what storage backends report; `TopicError` is the
//! user-facing taxonomy the HTTP and WebSocket layers map to status codes
//! and error frames.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum TopicError {
    #[error("Topic not found")]
    NotFound,

    #[error("Forbidden - invalid secret")]
    Forbidden,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Content exceeds size limit ({limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TopicError {
    /// Machine-readable code used in WebSocket error frames and JSON bodies
    pub fn code(&self) -> &'static str {
        match self {
            TopicError::NotFound => "NOT_FOUND",
            TopicError::Forbidden => "FORBIDDEN",
            TopicError::InvalidFormat(_) => "INVALID_FORMAT",
            TopicError::TooLarge { .. } => "TOO_LARGE",
            TopicError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> u16 {
        match self {
            TopicError::NotFound => 404,
            TopicError::Forbidden => 403,
            TopicError::InvalidFormat(_) => 400,
            TopicError::TooLarge { .. } => 413,
            TopicError::Internal(_) => 500,
        }
    }

    /// Message safe to show to clients
    ///
    /// Internal details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            TopicError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for TopicError {
    fn from(err: StoreError) -> Self {
        TopicError::Internal(err.to_string())
    }
}

pub type TopicResult<T> = Result<T, TopicError>;
