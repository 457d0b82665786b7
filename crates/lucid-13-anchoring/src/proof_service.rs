//! `MerkleProofService`: serves inclusion proofs against an anchored
//! session's root, replaying the same deterministic reduction
//! `lucid-07-merkle` used when the tree was first built (spec.md §4.9).

use crate::anchoring::AnchoringService;
use crate::errors::ProofError;
use lucid_07_merkle::{InclusionProof, MerkleBuilder};
use lucid_types::Hash;
use std::sync::Arc;

/// An inclusion proof plus the block location it was anchored at, if
/// the session has reached that far yet.
#[derive(Debug, Clone)]
pub struct AnchoredProof {
    pub proof: InclusionProof,
    pub root: Hash,
    pub block_id: Option<Hash>,
    pub block_height: Option<u64>,
}

pub struct MerkleProofService {
    anchoring: Arc<AnchoringService>,
}

impl MerkleProofService {
    #[must_use]
    pub fn new(anchoring: Arc<AnchoringService>) -> Self {
        Self { anchoring }
    }

    async fn tree_for(&self, manifest_hash: Hash) -> Result<lucid_07_merkle::FinalizedMerkleTree, ProofError> {
        let (leaves, algorithm) =
            self.anchoring.leaves_for(manifest_hash).await.ok_or(ProofError::NotFound(manifest_hash))?;

        let mut builder = MerkleBuilder::new(algorithm);
        for leaf in leaves {
            builder.append(leaf);
        }
        Ok(builder.finalize(0)?)
    }

    /// Proves inclusion of the leaf at `leaf_index`.
    pub async fn prove_by_index(&self, manifest_hash: Hash, leaf_index: u64) -> Result<AnchoredProof, ProofError> {
        let tree = self.tree_for(manifest_hash).await?;
        let proof = tree.prove(leaf_index)?;
        let (block_id, block_height) = self.anchoring.anchor_location(manifest_hash).await.unwrap_or((None, None));
        Ok(AnchoredProof { proof, root: tree.root(), block_id, block_height })
    }

    /// Proves inclusion of the leaf matching `leaf_hash`, looking up
    /// its index first.
    pub async fn prove_by_leaf_hash(&self, manifest_hash: Hash, leaf_hash: Hash) -> Result<AnchoredProof, ProofError> {
        let (leaves, _) =
            self.anchoring.leaves_for(manifest_hash).await.ok_or(ProofError::NotFound(manifest_hash))?;
        let index = leaves
            .iter()
            .position(|h| *h == leaf_hash)
            .ok_or(ProofError::LeafHashNotFound(leaf_hash))?;
        self.prove_by_index(manifest_hash, index as u64).await
    }
}
