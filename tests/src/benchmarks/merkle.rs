//! Merkle accumulation cost for session lengths from a short call to
//! the multi-hour sessions spec.md §4.9 anchors in batches.

use lucid_07_merkle::MerkleBuilder;
use lucid_types::HashAlgorithm;
use std::time::Instant;

fn leaf(i: u64) -> [u8; 32] {
    let mut h = [0u8; 32];
    h[..8].copy_from_slice(&i.to_le_bytes());
    lucid_crypto::blake3_hash(&h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_thousand_leaf_session_finalizes_under_a_second() {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for i in 0..10_000u64 {
            builder.append(leaf(i));
        }

        let started = Instant::now();
        let tree = builder.finalize(0).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(tree.leaf_count(), 10_000);
        assert!(elapsed.as_secs() < 1, "finalize took {elapsed:?} for 10k leaves");
    }

    #[test]
    fn inclusion_proofs_stay_cheap_as_the_tree_grows() {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        let leaves: Vec<[u8; 32]> = (0..5_000u64).map(leaf).collect();
        for l in &leaves {
            builder.append(*l);
        }
        let tree = builder.finalize(0).unwrap();

        let started = Instant::now();
        for index in [0u64, 2_500, 4_999] {
            let proof = tree.prove(index).unwrap();
            assert!(lucid_07_merkle::verify(tree.root(), leaves[index as usize], &proof));
        }
        assert!(started.elapsed().as_millis() < 200);
    }
}
