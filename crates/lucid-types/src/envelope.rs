//! # `AuthenticatedMessage` Envelope
//!
//! The universal wrapper for all messages carried over `lucid-bus`.
//!
//! ## Security Properties
//!
//! - **Versioning**: all messages include a `version` field for forward compatibility.
//! - **Correlation**: request/response flows use `correlation_id` and `reply_to`.
//! - **Time-bounded replay prevention**: nonces are only valid within the timestamp window.
//! - **Envelope authority**: `sender` is the sole source of truth for identity; payloads
//!   must not duplicate it.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use uuid::Uuid;

/// The topic/component for routing responses in request/response flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    /// The topic name to publish the response to.
    pub topic: String,
    /// The component that should receive the response.
    pub component: String,
}

/// The universal message envelope for everything published on `lucid-bus`.
///
/// - `sender` is the ONLY source of truth for the sender's identity.
/// - Payloads MUST NOT contain redundant identity fields.
/// - Request/response flows MUST use `correlation_id` and `reply_to`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedMessage<T> {
    /// Protocol version for forward compatibility. Checked before processing.
    pub version: u16,

    /// Identity of the component that produced this message.
    pub sender: String,

    /// Intended recipient component, or a topic broadcast if `None`.
    pub recipient: Option<String>,

    /// Correlates request/response pairs. For requests, a freshly generated
    /// id; for responses, the id from the originating request.
    pub correlation_id: Uuid,

    /// Routing for responses. Present on requests that expect a reply;
    /// responders must validate `reply_to.component == sender`.
    pub reply_to: Option<ReplyTo>,

    /// Unix timestamp (seconds) when the message was created.
    /// Valid window: `now - 60s <= timestamp <= now + 10s`.
    pub timestamp: u64,

    /// Unique nonce for replay prevention within the timestamp window.
    pub nonce: Uuid,

    /// Ed25519 signature over the serialized header + payload.
    #[serde_as(as = "Bytes")]
    pub signature: [u8; 64],

    /// The message payload.
    pub payload: T,
}

impl<T> AuthenticatedMessage<T> {
    pub const CURRENT_VERSION: u16 = 1;
    pub const MAX_FUTURE_SKEW: u64 = 10;
    pub const MAX_AGE: u64 = 60;
    pub const NONCE_CACHE_TTL: u64 = 120;
}

/// Result of message verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Valid,
    UnsupportedVersion { received: u16, supported: u16 },
    TimestampOutOfRange { timestamp: u64, now: u64 },
    ReplayDetected { nonce: Uuid },
    InvalidSignature,
    ReplyToMismatch { reply_to_component: String, sender: String },
}

impl VerificationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.is_valid()
    }
}
