//! Error types for Merkle tree construction and proof verification.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot finalize a tree with zero leaves")]
    EmptyTree,

    #[error("no leaf at index {index}")]
    LeafNotFound { index: u64 },
}
