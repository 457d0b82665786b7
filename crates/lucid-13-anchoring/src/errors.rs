//! Error types for manifest submission and proof generation.

use lucid_07_merkle::MerkleError;
use lucid_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("mempool rejected the session-anchor transaction: {0}")]
    MempoolRejected(String),

    #[error("no anchor submission found for manifest hash {0:?}")]
    NotFound(Hash),
}

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("no anchor submission found for manifest hash {0:?}")]
    NotFound(Hash),

    #[error("no leaf with hash {0:?} in this session's chunk list")]
    LeafHashNotFound(Hash),

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}
