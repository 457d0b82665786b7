//! Append-only Merkle builder over a session's chunk ciphertext hashes.
//!
//! Tree construction rule: pair adjacent nodes left-to-right; an odd
//! node at a level is promoted unchanged to the next level rather than
//! duplicated. The builder is append-only until `finalize`; after that
//! the tree is immutable.

use crate::errors::MerkleError;
use lucid_crypto::HashAlgorithmTag;
use lucid_types::{Hash, HashAlgorithm, MerkleTreeDescriptor};

fn to_tag(algorithm: HashAlgorithm) -> HashAlgorithmTag {
    match algorithm {
        HashAlgorithm::Blake3 => HashAlgorithmTag::Blake3,
        HashAlgorithm::Sha256 => HashAlgorithmTag::Sha256,
    }
}

/// Accumulates leaf hashes for one session's Merkle tree, in index order.
pub struct MerkleBuilder {
    algorithm: HashAlgorithm,
    leaves: Vec<Hash>,
}

impl MerkleBuilder {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            leaves: Vec::new(),
        }
    }

    /// Appends the next leaf hash. Returns the leaf's dense, zero-based
    /// index (assigned at append time).
    pub fn append(&mut self, leaf_hash: Hash) -> u64 {
        self.leaves.push(leaf_hash);
        (self.leaves.len() - 1) as u64
    }

    pub fn leaf_count(&self) -> u64 {
        self.leaves.len() as u64
    }

    /// Consumes the builder and reduces its leaves to a root, retaining
    /// every intermediate level so inclusion proofs can be generated.
    pub fn finalize(self, build_timestamp: u64) -> Result<FinalizedMerkleTree, MerkleError> {
        if self.leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let tag = to_tag(self.algorithm);
        let leaf_count = self.leaves.len() as u64;
        let levels = build_levels(tag, self.leaves);
        let root = levels.last().unwrap()[0];
        let height = (levels.len() - 1) as u32;

        Ok(FinalizedMerkleTree {
            algorithm: self.algorithm,
            leaf_count,
            height,
            root,
            build_timestamp,
            levels,
        })
    }
}

/// Builds every level of the tree bottom-up; `levels[0]` is the leaves.
fn build_levels(algorithm: HashAlgorithmTag, leaves: Vec<Hash>) -> Vec<Vec<Hash>> {
    let mut levels = vec![leaves];

    while levels.last().unwrap().len() > 1 {
        let current = levels.last().unwrap();
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        let mut pairs = current.chunks_exact(2);

        for pair in pairs.by_ref() {
            next.push(lucid_crypto::hash_pair(algorithm, &pair[0], &pair[1]));
        }

        if let [odd] = pairs.remainder() {
            next.push(*odd);
        }

        levels.push(next);
    }

    levels
}

/// An immutable, finalized Merkle tree. Exposes `(root, leaf_count,
/// height)` and generates inclusion proofs against its retained levels.
#[derive(Debug)]
pub struct FinalizedMerkleTree {
    algorithm: HashAlgorithm,
    leaf_count: u64,
    height: u32,
    root: Hash,
    build_timestamp: u64,
    levels: Vec<Vec<Hash>>,
}

impl FinalizedMerkleTree {
    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn descriptor(&self) -> MerkleTreeDescriptor {
        MerkleTreeDescriptor {
            root: self.root,
            leaf_count: self.leaf_count,
            height: self.height,
            build_timestamp: self.build_timestamp,
            algorithm: self.algorithm,
        }
    }

    /// Inclusion proof for the leaf at `index`: the sibling digest at
    /// each level on the path from leaf to root. A `None` entry marks a
    /// level where the leaf's node was the promoted odd node, so no
    /// sibling hash contributes at that level.
    pub fn prove(&self, index: u64) -> Result<crate::proof::InclusionProof, MerkleError> {
        if index >= self.leaf_count {
            return Err(MerkleError::LeafNotFound { index });
        }

        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut pos = index as usize;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_pos = if pos % 2 == 0 { pos + 1 } else { pos - 1 };
            siblings.push(level.get(sibling_pos).copied());
            pos /= 2;
        }

        Ok(crate::proof::InclusionProof {
            leaf_index: index,
            leaf_count: self.leaf_count,
            algorithm: self.algorithm,
            siblings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> Hash {
        [n; 32]
    }

    #[test]
    fn single_leaf_tree_roots_to_the_leaf_itself() {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        builder.append(leaf(1));
        let tree = builder.finalize(0).unwrap();

        assert_eq!(tree.root(), leaf(1));
        assert_eq!(tree.height(), 0);
        let proof = tree.prove(0).unwrap();
        assert!(proof.siblings.is_empty());
    }

    #[test]
    fn empty_builder_refuses_to_finalize() {
        let builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        assert_eq!(builder.finalize(0).unwrap_err(), MerkleError::EmptyTree);
    }

    // Scenario 1: three chunks, odd leaf promoted at level 1.
    #[test]
    fn three_leaves_promote_the_odd_node_at_level_one() {
        let leaves = [leaf(0), leaf(1), leaf(2)];
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for l in leaves {
            builder.append(l);
        }
        let tree = builder.finalize(0).unwrap();

        let h01 = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &leaves[0], &leaves[1]);
        let expected_root = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &h01, &leaves[2]);

        assert_eq!(tree.height(), 2);
        assert_eq!(tree.root(), expected_root);
    }

    // Scenario 2: five chunks, odd leaf promoted twice before the final pairing.
    #[test]
    fn five_leaves_promote_the_odd_node_twice() {
        let leaves: Vec<Hash> = (0u8..5).map(leaf).collect();
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for l in &leaves {
            builder.append(*l);
        }
        let tree = builder.finalize(0).unwrap();

        let h01 = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &leaves[0], &leaves[1]);
        let h23 = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &leaves[2], &leaves[3]);
        let level2 = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &h01, &h23);
        let expected_root = lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &level2, &leaves[4]);

        assert_eq!(tree.height(), 3);
        assert_eq!(tree.root(), expected_root);

        // Proof for the promoted leaf (index 4) carries no sibling at the
        // first two levels, then one sibling at the root level.
        let proof = tree.prove(4).unwrap();
        assert_eq!(proof.siblings, vec![None, None, Some(level2)]);
        assert!(proof.verify(tree.root(), leaves[4]));
    }

    #[test]
    fn every_leaf_proof_verifies_against_the_root() {
        let leaves: Vec<Hash> = (0u8..7).map(leaf).collect();
        let mut builder = MerkleBuilder::new(HashAlgorithm::Sha256);
        for l in &leaves {
            builder.append(*l);
        }
        let tree = builder.finalize(0).unwrap();

        for (i, l) in leaves.iter().enumerate() {
            let proof = tree.prove(i as u64).unwrap();
            assert!(proof.verify(tree.root(), *l));
        }
    }

    #[test]
    fn proof_for_out_of_range_index_fails() {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        builder.append(leaf(0));
        let tree = builder.finalize(0).unwrap();

        assert_eq!(
            tree.prove(5).unwrap_err(),
            MerkleError::LeafNotFound { index: 5 }
        );
    }
}
