//! Error types for block lookups and validation.

use lucid_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockServiceError {
    #[error("no block found for id {0:?}")]
    NotFoundById(Hash),

    #[error("no block found at height {0}")]
    NotFoundByHeight(u64),

    #[error("chain is empty, no latest block")]
    ChainEmpty,

    #[error("block at height {height} already exists with a different id")]
    HeightConflict { height: u64 },
}

/// Reasons a block fails the validation checklist (spec.md §4.9, points 1-6).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockValidationError {
    #[error("block {0:?} has no transactions and no consensus record")]
    EmptyStructure(Hash),

    #[error("block timestamp {timestamp} is outside the allowed skew of parent timestamp {parent_timestamp} (max drift {max_drift_secs}s)")]
    TimestampSkew { timestamp: u64, parent_timestamp: u64, max_drift_secs: u64 },

    #[error("declared merkle root does not match the root computed over the transaction list")]
    MerkleMismatch,

    #[error("transaction {0:?} failed isolated validation: {1}")]
    InvalidTransaction(Hash, String),

    #[error("previous_hash {got:?} does not match parent id {expected:?}")]
    PreviousHashMismatch { expected: Hash, got: Hash },

    #[error("consensus record is missing or malformed: {0}")]
    MalformedConsensus(String),
}
