//! Pipeline error taxonomy (spec.md §7): validation, consistency, and
//! resource-exhaustion errors the Coordinator can surface or act on.

use lucid_types::SessionId;
use thiserror::Error;

/// Errors surfaced by the Pipeline Coordinator's public operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {session} cannot {action} from state {from:?}")]
    InvalidTransition {
        session: SessionId,
        from: lucid_types::SessionState,
        action: String,
    },

    #[error("session {session} chunk index gap: expected {expected}, got {got}")]
    ChunkIndexGap {
        session: SessionId,
        expected: u64,
        got: u64,
    },

    #[error("compression failed: {0}")]
    Compression(#[from] lucid_05_compression::CompressionError),

    #[error("encryption failed: {0}")]
    Encryption(#[from] lucid_06_encryption::EncryptionError),

    #[error("merkle build failed: {0}")]
    Merkle(#[from] lucid_07_merkle::MerkleError),

    #[error("durable store write failed: {0}")]
    Store(String),
}
