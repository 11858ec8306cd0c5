/// Input validation shared by the topic directory and the HTTP/WebSocket boundary
///
/// Both layers call these helpers so a bad id or oversized document is
/// rejected with the same error wherever it enters.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{TopicError, TopicResult};

/// Default upper bound on a document, in UTF-8 bytes (1 MiB)
pub const MAX_CONTENT_BYTES: usize = 1_048_576;

/// Reaction emoji length bound, in UTF-16 code units
///
/// Loose enough for multi-codepoint sequences (skin tones, ZWJ families).
pub const MAX_EMOJI_UNITS: usize = 10;

static TOPIC_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{22}$").expect("topic id regex compiles"));

/// 22 base64url characters
pub fn validate_topic_id(topic_id: &str) -> bool {
    TOPIC_ID_RE.is_match(topic_id)
}

/// UTF-8 size of a document
pub fn content_size(content: &str) -> usize {
    content.len()
}

pub fn validate_content_size(content: &str, limit: usize) -> bool {
    content_size(content) <= limit
}

/// Non-empty and at most MAX_EMOJI_UNITS UTF-16 code units
pub fn validate_emoji(emoji: &str) -> bool {
    let units = emoji.encode_utf16().count();
    units > 0 && units <= MAX_EMOJI_UNITS
}

pub fn check_topic_id(topic_id: &str) -> TopicResult<()> {
    if validate_topic_id(topic_id) {
        Ok(())
    } else {
        Err(TopicError::InvalidFormat("Invalid topic ID format".to_string()))
    }
}

pub fn check_content_size(content: &str, limit: usize) -> TopicResult<()> {
    let size = content_size(content);
    if size <= limit {
        Ok(())
    } else {
        Err(TopicError::TooLarge { size, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_id_shape() {
        assert!(validate_topic_id("AAAAAAAAAAAAAAAAAAAAAA"));
        assert!(validate_topic_id("abc-DEF_123-abc-DEF_12"));

        assert!(!validate_topic_id(""));
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAA")); // 21
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAAAA")); // 23
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAA="));
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAA+"));
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAA/"));
        assert!(!validate_topic_id("AAAAAAAAAAAAAAAAAAAAAA\n"));
    }

    #[test]
    fn test_content_boundary() {
        let exact = "a".repeat(MAX_CONTENT_BYTES);
        let over = "a".repeat(MAX_CONTENT_BYTES + 1);

        assert!(validate_content_size(&exact, MAX_CONTENT_BYTES));
        assert!(!validate_content_size(&over, MAX_CONTENT_BYTES));
        assert!(check_content_size(&exact, MAX_CONTENT_BYTES).is_ok());
        assert!(matches!(
            check_content_size(&over, MAX_CONTENT_BYTES),
            Err(TopicError::TooLarge { size, .. }) if size == MAX_CONTENT_BYTES + 1
        ));
    }

    #[test]
    fn test_content_size_counts_bytes() {
        // 4 bytes in UTF-8, one char
        assert_eq!(content_size("🎉"), 4);
        assert_eq!(content_size("é"), 2);
    }

    #[test]
    fn test_emoji_bounds() {
        assert!(validate_emoji("👍")); // 2 units
        assert!(validate_emoji("👍🏽")); // 4 units with skin tone
        assert!(validate_emoji("ok"));
        assert!(validate_emoji("0123456789"));

        assert!(!validate_emoji(""));
        assert!(!validate_emoji("01234567890"));
        // Family sequence: four surrogate pairs plus three joiners = 11 units
        assert!(!validate_emoji("👨\u{200d}👩\u{200d}👧\u{200d}👦"));
    }
}
