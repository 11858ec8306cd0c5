//! Capability codec
//!
//! A topic id is 16 random bytes; its secret is HMAC-SHA256 of those bytes
//! under the server key. Both travel base64url-encoded without padding.
//! Secrets are never stored: verification recomputes the MAC, so rotating
//! the key invalidates every secret issued before.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use crate::config::SecurityConfig;
use crate::logger::{self, LogTag};

type HmacSha256 = Hmac<Sha256>;

/// Raw length of a topic id
pub const TOPIC_ID_BYTES: usize = 16;

/// Length of a generated signing key
pub const SIGNING_KEY_BYTES: usize = 32;

/// Access level of one request against one topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No secret supplied
    Readable,
    /// Secret supplied and verified
    Writable,
    /// Secret supplied but wrong or undecodable
    Invalid,
}

impl AccessLevel {
    pub fn is_writable(&self) -> bool {
        matches!(self, AccessLevel::Writable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Readable => "readable",
            AccessLevel::Writable => "writable",
            AccessLevel::Invalid => "invalid",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A freshly issued topic id and its publisher secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPair {
    pub topic_id: String,
    pub secret: String,
}

/// Where the signing key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Configured,
    Ephemeral,
}

/// Signs and verifies topic capabilities with one process-wide key
#[derive(Clone)]
pub struct CapabilityCodec {
    mac: HmacSha256,
    source: KeySource,
}

impl fmt::Debug for CapabilityCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityCodec")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl CapabilityCodec {
    /// Build a codec from raw key bytes
    pub fn new(key: &[u8]) -> Result<Self, String> {
        Self::with_source(key, KeySource::Configured)
    }

    /// Build a codec with a random key that only lives for this process
    pub fn ephemeral() -> Self {
        let mut key = [0u8; SIGNING_KEY_BYTES];
        OsRng.fill_bytes(&mut key);
        Self::with_source(&key, KeySource::Ephemeral)
            .expect("HMAC accepts any non-empty key length")
    }

    /// Build the codec from configuration
    ///
    /// Missing or undecodable keys fall back to an ephemeral key. Secrets
    /// issued under an ephemeral key stop verifying after a restart, so the
    /// fallback is logged as a warning rather than hidden.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let configured = config.hmac_key.trim();
        if configured.is_empty() {
            logger::warning(
                LogTag::Security,
                "HMAC_KEY not set, using a random key for this run (secrets will not survive a restart)",
            );
            return Self::ephemeral();
        }

        let decoded = URL_SAFE_NO_PAD
            .decode(configured.trim_end_matches('='))
            .map_err(|e| e.to_string())
            .and_then(|bytes| Self::new(&bytes));

        match decoded {
            Ok(codec) => {
                logger::debug(LogTag::Security, "Signing key loaded from configuration");
                codec
            }
            Err(e) => {
                logger::warning(
                    LogTag::Security,
                    &format!("Invalid HMAC_KEY ({}), using a random key for this run", e),
                );
                Self::ephemeral()
            }
        }
    }

    fn with_source(key: &[u8], source: KeySource) -> Result<Self, String> {
        if key.is_empty() {
            return Err("signing key is empty".to_string());
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|e| e.to_string())?;
        Ok(Self { mac, source })
    }

    pub fn key_source(&self) -> KeySource {
        self.source
    }

    pub fn is_ephemeral(&self) -> bool {
        self.source == KeySource::Ephemeral
    }

    /// Issue a new topic id and its secret
    ///
    /// No uniqueness check is made; 128 random bits make collisions negligible.
    pub fn generate_topic(&self) -> TopicPair {
        let mut raw_id = [0u8; TOPIC_ID_BYTES];
        OsRng.fill_bytes(&mut raw_id);

        let mut mac = self.mac.clone();
        mac.update(&raw_id);
        let signature = mac.finalize().into_bytes();

        TopicPair {
            topic_id: URL_SAFE_NO_PAD.encode(raw_id),
            secret: URL_SAFE_NO_PAD.encode(signature),
        }
    }

    /// Classify a request from its topic id and (possibly empty) secret
    ///
    /// Never fails: every decode or MAC problem is `Invalid`.
    pub fn verify_access(&self, topic_id: &str, secret: &str) -> AccessLevel {
        if secret.is_empty() {
            return AccessLevel::Readable;
        }

        let raw_id = match URL_SAFE_NO_PAD.decode(topic_id) {
            Ok(bytes) => bytes,
            Err(e) => {
                logger::debug(
                    LogTag::Security,
                    &format!("Undecodable topic id {}: {}", topic_id, e),
                );
                return AccessLevel::Invalid;
            }
        };
        let signature = match URL_SAFE_NO_PAD.decode(secret) {
            Ok(bytes) => bytes,
            Err(_) => {
                logger::debug(
                    LogTag::Security,
                    &format!("Undecodable secret for topic {}", topic_id),
                );
                return AccessLevel::Invalid;
            }
        };

        let mut mac = self.mac.clone();
        mac.update(&raw_id);
        // verify_slice compares in constant time
        match mac.verify_slice(&signature) {
            Ok(()) => AccessLevel::Writable,
            Err(_) => {
                logger::debug(
                    LogTag::Security,
                    &format!("Secret mismatch for topic {}", topic_id),
                );
                AccessLevel::Invalid
            }
        }
    }
}
