//! Merkle leaf-hashing and root-building tasks
//!
//! `lucid-07-merkle` owns the pairwise promote-odd-node algorithm; this
//! module only provides the batched leaf-hashing kernel it dispatches
//! work to, plus a convenience root builder used by tests and the
//! worker-pool benchmarks.

use crate::{ComputeEngine, ComputeError};
use lucid_crypto::HashAlgorithmTag;
use std::sync::Arc;

/// Batch-hash raw leaf payloads into Merkle leaf hashes.
pub struct LeafHashTask {
    pub algorithm: HashAlgorithmTag,
    pub payloads: Vec<Vec<u8>>,
}

impl LeafHashTask {
    /// Execute the batched leaf hash.
    pub async fn execute(
        self,
        engine: &Arc<dyn ComputeEngine>,
    ) -> Result<Vec<[u8; 32]>, ComputeError> {
        engine.hash_leaf(self.algorithm, &self.payloads).await
    }
}

/// Compute a Merkle root from pre-hashed leaves using the promote-odd-node
/// pairing rule: a level with an odd node promotes it unchanged rather than
/// duplicating it.
pub struct MerkleRootTask {
    pub algorithm: HashAlgorithmTag,
    pub leaf_hashes: Vec<[u8; 32]>,
}

impl MerkleRootTask {
    /// Execute merkle root computation
    pub async fn execute(self, _engine: &Arc<dyn ComputeEngine>) -> Result<[u8; 32], ComputeError> {
        if self.leaf_hashes.is_empty() {
            return Ok([0u8; 32]);
        }

        let mut current_level = self.leaf_hashes;

        while current_level.len() > 1 {
            let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));
            let mut pairs = current_level.chunks_exact(2);

            for pair in pairs.by_ref() {
                next_level.push(lucid_crypto::hash_pair(
                    self.algorithm,
                    &pair[0],
                    &pair[1],
                ));
            }

            if let [odd] = pairs.remainder() {
                next_level.push(*odd);
            }

            current_level = next_level;
        }

        Ok(current_level[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::cpu::CpuEngine;

    #[tokio::test]
    async fn leaf_hash_task_hashes_each_payload() {
        let engine: Arc<dyn ComputeEngine> = Arc::new(CpuEngine::new());
        let task = LeafHashTask {
            algorithm: HashAlgorithmTag::Blake3,
            payloads: vec![b"chunk-0".to_vec(), b"chunk-1".to_vec()],
        };

        let hashes = task.execute(&engine).await.unwrap();
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0], lucid_crypto::blake3_hash(b"chunk-0"));
    }

    #[tokio::test]
    async fn root_promotes_odd_node_without_duplication() {
        let engine: Arc<dyn ComputeEngine> = Arc::new(CpuEngine::new());
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32]];

        let task = MerkleRootTask {
            algorithm: HashAlgorithmTag::Blake3,
            leaf_hashes: leaves.clone(),
        };
        let root = task.execute(&engine).await.unwrap();

        let expected_level1 = lucid_crypto::hash_pair(
            HashAlgorithmTag::Blake3,
            &leaves[0],
            &leaves[1],
        );
        let expected_root =
            lucid_crypto::hash_pair(HashAlgorithmTag::Blake3, &expected_level1, &leaves[2]);

        assert_eq!(root, expected_root);
    }
}
