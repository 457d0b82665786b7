//! Merkle inclusion proofs.
//!
//! Generation lives on `FinalizedMerkleTree`; verification is a
//! standalone function so a verifier (the Anchoring Service, an
//! external observer) needs only the root and the proof, not the full
//! tree.

use lucid_crypto::HashAlgorithmTag;
use lucid_types::{Hash, HashAlgorithm};
use serde::{Deserialize, Serialize};

fn to_tag(algorithm: HashAlgorithm) -> HashAlgorithmTag {
    match algorithm {
        HashAlgorithm::Blake3 => HashAlgorithmTag::Blake3,
        HashAlgorithm::Sha256 => HashAlgorithmTag::Sha256,
    }
}

/// Sibling digest at each level from leaf to root. `None` at a level
/// means the leaf's node was the promoted odd node there, so nothing
/// pairs with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub leaf_count: u64,
    pub algorithm: HashAlgorithm,
    pub siblings: Vec<Option<Hash>>,
}

impl InclusionProof {
    /// Reconstructs a root from `leaf_hash` and this proof, walking
    /// upward using the parity of the index at each level (even index
    /// means the current node is the left child).
    pub fn verify(&self, root: Hash, leaf_hash: Hash) -> bool {
        let tag = to_tag(self.algorithm);
        let mut current = leaf_hash;
        let mut index = self.leaf_index;

        for sibling in &self.siblings {
            current = match sibling {
                None => current,
                Some(sibling) if index % 2 == 0 => lucid_crypto::hash_pair(tag, &current, sibling),
                Some(sibling) => lucid_crypto::hash_pair(tag, sibling, &current),
            };
            index /= 2;
        }

        current == root
    }
}

/// Free-function form of [`InclusionProof::verify`].
pub fn verify(root: Hash, leaf_hash: Hash, proof: &InclusionProof) -> bool {
    proof.verify(root, leaf_hash)
}
