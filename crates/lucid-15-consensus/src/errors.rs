//! Error types for proposal, voting, and finalization.

use lucid_14_block_service::BlockValidationError;
use lucid_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("block {0:?} already has an open round")]
    DuplicateProposal(Hash),

    #[error("no open round for block {0:?}")]
    NoSuchRound(Hash),

    #[error("vote from a validator not in the current validator set")]
    UnknownValidator,

    #[error("proposed block failed admission: {0}")]
    Rejected(#[from] BlockValidationError),
}
