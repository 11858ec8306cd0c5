/// WebSocket message schema
///
/// Frames in both directions are sparse JSON objects: every field is
/// optional and an absent field means "unchanged". Errors travel as
/// `{"error": "...", "code": "..."}` to the offending sender only.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::fmt;

use crate::errors::TopicError;

// ============================================================================
// PAYLOADS
// ============================================================================

/// Viewer reaction, relayed verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub timestamp: Number,
}

/// Public side-channel open to every access level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PubPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
}

// ============================================================================
// INBOUND
// ============================================================================

/// Client → server frame
///
/// Write fields keep an explicit `null` apart from an absent key: the outer
/// `Option` is presence, the inner one the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(default, deserialize_with = "present")]
    pub markdown: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub current_page: Option<Option<Number>>,

    #[serde(default, deserialize_with = "present")]
    pub current_section: Option<Option<Number>>,

    #[serde(default, rename = "pub")]
    pub publication: Option<PubPayload>,
}

/// Any key that made it into the frame is present, `null` included
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Markdown value, if the key was sent with a string
    pub fn content(&self) -> Option<&str> {
        self.markdown.as_ref().and_then(|m| m.as_deref())
    }

    pub fn has_navigation(&self) -> bool {
        self.current_page.is_some() || self.current_section.is_some()
    }

    /// A navigation key was sent as `null`
    pub fn has_null_navigation(&self) -> bool {
        matches!(self.current_page, Some(None)) || matches!(self.current_section, Some(None))
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        self.publication.as_ref().and_then(|p| p.reaction.as_ref())
    }
}

// ============================================================================
// OUTBOUND
// ============================================================================

/// Server → client frame carrying topic state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_section: Option<Number>,

    #[serde(default, rename = "pub", skip_serializing_if = "Option::is_none")]
    pub publication: Option<PubPayload>,
}

impl OutboundMessage {
    pub fn content(markdown: impl Into<String>) -> Self {
        Self {
            markdown: Some(markdown.into()),
            ..Self::default()
        }
    }

    /// Navigation update with exactly the supplied fields
    pub fn navigation(current_page: Option<Number>, current_section: Option<Number>) -> Self {
        Self {
            current_page,
            current_section,
            ..Self::default()
        }
    }

    pub fn reaction(reaction: Reaction) -> Self {
        Self {
            publication: Some(PubPayload {
                reaction: Some(reaction),
            }),
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Codes carried by error frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Forbidden,
    InvalidMessage,
    InvalidEmoji,
    NotFound,
    TooLarge,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::InvalidEmoji => "INVALID_EMOJI",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::TooLarge => "TOO_LARGE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error frame sent to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
    pub code: String,
}

impl ErrorFrame {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.as_str().to_string(),
        }
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, "Permission denied")
    }

    pub fn invalid_message() -> Self {
        Self::new(ErrorCode::InvalidMessage, "Invalid message format")
    }

    pub fn invalid_emoji() -> Self {
        Self::new(ErrorCode::InvalidEmoji, "Invalid emoji")
    }

    /// Map a failed content write onto a frame for the sender
    pub fn from_topic_error(err: &TopicError) -> Self {
        let code = match err {
            TopicError::NotFound => ErrorCode::NotFound,
            TopicError::Forbidden => ErrorCode::Forbidden,
            TopicError::InvalidFormat(_) => ErrorCode::InvalidMessage,
            TopicError::TooLarge { .. } => ErrorCode::TooLarge,
            TopicError::Internal(_) => ErrorCode::Internal,
        };
        Self::new(code, err.public_message())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
