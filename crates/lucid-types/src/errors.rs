//! # Cross-Crate Error Vocabulary
//!
//! Shared error types consumed by more than one crate in the workspace.
//! Leaf crates define their own typed errors and convert into these at
//! their public boundary.

use thiserror::Error;

/// Errors from session chunk storage and retrieval.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("chunk not found: {0}")]
    NotFound(String),

    #[error("data corruption: hash mismatch for chunk {locator}")]
    DataCorruption { locator: String },

    #[error("disk full: only {available_percent}% available, need 5%")]
    DiskFull { available_percent: u8 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors related to bus envelope verification.
#[derive(Debug, Clone, Error)]
pub enum MessageError {
    #[error("unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    #[error("timestamp out of range: {timestamp} not within valid window")]
    TimestampOutOfRange { timestamp: u64 },

    #[error("replay detected: nonce {nonce} already seen")]
    ReplayDetected { nonce: String },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("reply-to mismatch: reply_to.component={reply_to} != sender={sender}")]
    ReplyToMismatch { reply_to: String, sender: String },

    #[error("unauthorized: {sender} not allowed to publish {message_type}")]
    Unauthorized {
        sender: String,
        message_type: String,
    },
}

/// Node-wide operational state reported by `lucid-node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Running,
    Syncing,
    HaltedAwaitingIntervention,
}
