//! Deterministic block identifier: digest of `(version, height,
//! previous_hash, merkle_root, timestamp, nonce)` (spec.md §6).

use lucid_types::{BlockHeader, Hash};

#[must_use]
pub fn derive_block_id(header: &BlockHeader) -> Hash {
    lucid_crypto::hashing::blake3_hash_many(&[
        &header.version.to_be_bytes()[..],
        &header.height.to_be_bytes()[..],
        &header.previous_hash[..],
        &header.merkle_root[..],
        &header.timestamp.to_be_bytes()[..],
        &header.nonce.to_be_bytes()[..],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BlockHeader {
        BlockHeader { version: 1, height: 5, previous_hash: [1u8; 32], merkle_root: [2u8; 32], timestamp: 1_000, nonce: 7 }
    }

    #[test]
    fn id_is_deterministic() {
        assert_eq!(derive_block_id(&header()), derive_block_id(&header()));
    }

    #[test]
    fn changing_any_field_changes_the_id() {
        let base = derive_block_id(&header());
        let mut h = header();
        h.nonce += 1;
        assert_ne!(base, derive_block_id(&h));
    }
}
