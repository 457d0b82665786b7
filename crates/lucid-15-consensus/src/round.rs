//! A single consensus round for one proposed block: proposal, voting,
//! finalization (spec.md §4.9's three phases).

use crate::validator::ValidatorSet;
use lucid_types::{Hash, PublicKey, Vote};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Proposal,
    Voting,
    Finalized,
}

/// Tracks votes cast for one proposed block, deduplicated by
/// validator (a validator's later vote replaces its earlier one, per
/// the fork-choice store's latest-message-driven model).
pub struct ConsensusRound {
    pub block_id: Hash,
    pub proposer: PublicKey,
    votes: HashMap<PublicKey, Vote>,
    phase: RoundPhase,
}

impl ConsensusRound {
    #[must_use]
    pub fn new(block_id: Hash, proposer: PublicKey) -> Self {
        Self { block_id, proposer, votes: HashMap::new(), phase: RoundPhase::Proposal }
    }

    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Records a vote, replacing any earlier vote from the same
    /// validator. Only votes for this round's block are accepted.
    pub fn cast_vote(&mut self, vote: Vote) -> bool {
        if vote.block_hash != self.block_id {
            return false;
        }
        self.phase = RoundPhase::Voting;
        self.votes.insert(vote.node_id, vote);
        true
    }

    #[must_use]
    pub fn approve_stake(&self, validators: &ValidatorSet) -> u128 {
        self.votes.values().filter(|v| v.approve).map(|v| validators.stake_of(&v.node_id)).sum()
    }

    #[must_use]
    pub fn reject_stake(&self, validators: &ValidatorSet) -> u128 {
        self.votes.values().filter(|v| !v.approve).map(|v| validators.stake_of(&v.node_id)).sum()
    }

    #[must_use]
    pub fn has_approve_quorum(&self, validators: &ValidatorSet) -> bool {
        validators.has_quorum(self.approve_stake(validators))
    }

    pub fn votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.values()
    }

    pub fn mark_finalized(&mut self) {
        self.phase = RoundPhase::Finalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorInfo;

    fn validators() -> ValidatorSet {
        ValidatorSet::new(
            0,
            vec![
                ValidatorInfo { id: [1u8; 32], stake: 100, active: true },
                ValidatorInfo { id: [2u8; 32], stake: 100, active: true },
                ValidatorInfo { id: [3u8; 32], stake: 100, active: true },
            ],
        )
    }

    fn vote(node: u8, block_id: Hash, approve: bool) -> Vote {
        Vote { node_id: [node; 32], block_hash: block_id, approve, signature: [0u8; 64], timestamp: 1_000 }
    }

    #[test]
    fn votes_for_a_different_block_are_rejected() {
        let mut round = ConsensusRound::new([1u8; 32], [0u8; 32]);
        assert!(!round.cast_vote(vote(1, [9u8; 32], true)));
    }

    #[test]
    fn a_later_vote_from_the_same_validator_replaces_the_earlier_one() {
        let mut round = ConsensusRound::new([1u8; 32], [0u8; 32]);
        let vs = validators();
        round.cast_vote(vote(1, [1u8; 32], true));
        assert_eq!(round.approve_stake(&vs), 100);
        round.cast_vote(vote(1, [1u8; 32], false));
        assert_eq!(round.approve_stake(&vs), 0);
        assert_eq!(round.reject_stake(&vs), 100);
    }

    #[test]
    fn quorum_requires_more_than_two_thirds_approve_stake() {
        let mut round = ConsensusRound::new([1u8; 32], [0u8; 32]);
        let vs = validators();
        round.cast_vote(vote(1, [1u8; 32], true));
        round.cast_vote(vote(2, [1u8; 32], true));
        assert!(!round.has_approve_quorum(&vs));
        round.cast_vote(vote(3, [1u8; 32], true));
        assert!(round.has_approve_quorum(&vs));
    }
}
