//! # PoOT Consensus
//!
//! Weighted-validator voting across proposal, voting, and finalization
//! phases; quorum is strictly more than two-thirds of total stake.
//! Confirmed blocks promote to FINALIZED once the canonical chain's
//! depth past them reaches `finality_depth`; unextended minority forks
//! orphan after `orphan_depth` (spec.md §4.9).

mod errors;
mod fork_choice;
mod round;
mod service;
mod validator;

pub use errors::ConsensusError;
pub use fork_choice::ForkChoiceStore;
pub use round::{ConsensusRound, RoundPhase};
pub use service::{ConsensusConfig, ConsensusService};
pub use validator::{ValidatorInfo, ValidatorSet};
