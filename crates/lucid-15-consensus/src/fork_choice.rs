//! Stake-weighted fork choice with the lexicographic tip tie-break
//! (spec.md §4.9): on equal-depth competing chains, prefer the chain
//! with greater cumulative stake-weighted vote mass; on that tie,
//! prefer the chain whose tip has the lexicographically smaller id.

use lucid_types::Hash;
use std::collections::HashMap;

struct ChainNode {
    parent: Hash,
    height: u64,
    vote_mass: u128,
}

/// Tracks the block tree (parent links, heights) and the
/// stake-weighted approve-vote mass accumulated at each block, so the
/// canonical tip among competing chains can be chosen deterministically.
#[derive(Default)]
pub struct ForkChoiceStore {
    nodes: HashMap<Hash, ChainNode>,
}

impl ForkChoiceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_block(&mut self, id: Hash, parent: Hash, height: u64) {
        self.nodes.entry(id).or_insert(ChainNode { parent, height, vote_mass: 0 });
    }

    /// Adds `stake` to the vote mass recorded for `id` (called once
    /// per quorum-reaching round for that block).
    pub fn record_vote_mass(&mut self, id: Hash, stake: u128) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.vote_mass += stake;
        }
    }

    #[must_use]
    pub fn height_of(&self, id: Hash) -> Option<u64> {
        self.nodes.get(&id).map(|n| n.height)
    }

    #[must_use]
    pub fn parent_of(&self, id: Hash) -> Option<Hash> {
        self.nodes.get(&id).map(|n| n.parent)
    }

    /// Cumulative stake-weighted vote mass along the chain from `id`
    /// back to the root (the block with no registered parent).
    #[must_use]
    pub fn cumulative_vote_mass(&self, id: Hash) -> u128 {
        let mut total = 0u128;
        let mut current = id;
        let mut visited = std::collections::HashSet::new();
        while let Some(node) = self.nodes.get(&current) {
            if !visited.insert(current) {
                break;
            }
            total += node.vote_mass;
            if node.parent == current {
                break;
            }
            current = node.parent;
        }
        total
    }

    /// Chooses the canonical tip among `candidates`: greatest height
    /// first; ties broken by greater cumulative vote mass, then by the
    /// lexicographically smaller tip id.
    #[must_use]
    pub fn choose_head(&self, candidates: &[Hash]) -> Option<Hash> {
        candidates
            .iter()
            .copied()
            .max_by(|a, b| {
                let height_a = self.height_of(*a).unwrap_or(0);
                let height_b = self.height_of(*b).unwrap_or(0);
                height_a
                    .cmp(&height_b)
                    .then_with(|| self.cumulative_vote_mass(*a).cmp(&self.cumulative_vote_mass(*b)))
                    .then_with(|| b.cmp(a))
            })
    }

    /// Every block id currently registered, regardless of chain.
    #[must_use]
    pub fn all_ids(&self) -> Vec<Hash> {
        self.nodes.keys().copied().collect()
    }

    /// Every ancestor id of `tip`, walking back to (and including) the
    /// root. Used to decide which competing blocks are NOT on the
    /// canonical chain and so are orphan candidates.
    #[must_use]
    pub fn ancestors_of(&self, tip: Hash) -> Vec<Hash> {
        let mut chain = Vec::new();
        let mut current = tip;
        let mut visited = std::collections::HashSet::new();
        while let Some(node) = self.nodes.get(&current) {
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            if node.parent == current {
                break;
            }
            current = node.parent;
        }
        chain
    }
}
