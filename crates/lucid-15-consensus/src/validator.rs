//! Stake-weighted validator set (spec.md §4.9's weighted-validator
//! protocol).

use lucid_types::PublicKey;
use std::collections::HashMap;

/// One validator's voting weight for the current epoch.
#[derive(Debug, Clone)]
pub struct ValidatorInfo {
    pub id: PublicKey,
    pub stake: u128,
    pub active: bool,
}

/// The set of validators eligible to vote this epoch, with a lookup
/// table and a precomputed total stake.
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    pub epoch: u64,
    validators: Vec<ValidatorInfo>,
    lookup: HashMap<PublicKey, usize>,
    pub total_stake: u128,
}

impl ValidatorSet {
    #[must_use]
    pub fn new(epoch: u64, validators: Vec<ValidatorInfo>) -> Self {
        let total_stake = validators.iter().filter(|v| v.active).map(|v| v.stake).sum();
        let lookup = validators.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
        Self { epoch, validators, lookup, total_stake }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &PublicKey) -> bool {
        self.lookup.contains_key(id)
    }

    #[must_use]
    pub fn stake_of(&self, id: &PublicKey) -> u128 {
        self.lookup.get(id).map(|&i| self.validators[i].stake).unwrap_or(0)
    }

    /// Quorum stake: strictly more than two-thirds of total stake
    /// (spec.md §4.9).
    #[must_use]
    pub fn quorum_stake(&self) -> u128 {
        self.total_stake * 2 / 3 + 1
    }

    #[must_use]
    pub fn has_quorum(&self, stake_voted: u128) -> bool {
        stake_voted >= self.quorum_stake()
    }
}
