//! # Content Hashing
//!
//! BLAKE3 (default, SIMD-accelerated) and SHA-256 (for interop with
//! chains expecting SHA-256 digests) content hashing for chunk
//! ciphertext and Merkle leaves.

use blake3::Hasher;
use sha2::{Digest, Sha256};

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Which hash function a Merkle tree or chunk digest was built under.
/// Mirrors `lucid_types::HashAlgorithm`; kept separate so this crate has
/// no dependency on `lucid-types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithmTag {
    Blake3,
    Sha256,
}

/// Stateful BLAKE3 hasher.
pub struct Blake3Hasher {
    inner: Hasher,
}

impl Blake3Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
        }
    }

    /// Create keyed hasher (for MAC).
    pub fn new_keyed(key: &[u8; 32]) -> Self {
        Self {
            inner: Hasher::new_keyed(key),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(&self) -> Hash {
        let hash = self.inner.finalize();
        *hash.as_bytes()
    }

    /// Reset hasher for reuse.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs.
pub fn blake3_hash_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Blake3Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

/// Keyed hash (MAC).
pub fn blake3_keyed_hash(key: &[u8; 32], data: &[u8]) -> Hash {
    *blake3::keyed_hash(key, data).as_bytes()
}

/// Derive key from context and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let hash = hasher.finalize();
    output.copy_from_slice(hash.as_bytes());
    output
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Hash two 32-byte nodes together under the given algorithm. Shared by
/// every Merkle-tree construction and verification path so the two
/// never disagree on pairing order.
pub fn hash_pair(algorithm: HashAlgorithmTag, left: &Hash, right: &Hash) -> Hash {
    match algorithm {
        HashAlgorithmTag::Blake3 => {
            let mut hasher = Blake3Hasher::new();
            hasher.update(left);
            hasher.update(right);
            hasher.finalize()
        }
        HashAlgorithmTag::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(left);
            hasher.update(right);
            let result = hasher.finalize();
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&result);
            hash
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash() {
        let hash = blake3_hash(b"Hello, World!");
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn test_deterministic() {
        let h1 = blake3_hash(b"test");
        let h2 = blake3_hash(b"test");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_inputs() {
        let h1 = blake3_hash(b"input1");
        let h2 = blake3_hash(b"input2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_streaming() {
        let hash_oneshot = blake3_hash(b"hello world");

        let mut hasher = Blake3Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let hash_streaming = hasher.finalize();

        assert_eq!(hash_oneshot, hash_streaming);
    }

    #[test]
    fn test_keyed_hash() {
        let key = [0xABu8; 32];
        let h1 = blake3_keyed_hash(&key, b"data");
        let h2 = blake3_keyed_hash(&key, b"data");
        let h3 = blake3_keyed_hash(&[0xCDu8; 32], b"data");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_derive_key() {
        let key = blake3_derive_key("lucid chunk encryption", b"master secret");
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256_hash(b"test"), sha256_hash(b"test"));
        assert_ne!(sha256_hash(b"test"), blake3_hash(b"test"));
    }

    #[test]
    fn hash_pair_agrees_under_same_algorithm() {
        let (l, r) = ([1u8; 32], [2u8; 32]);
        let a = hash_pair(HashAlgorithmTag::Blake3, &l, &r);
        let b = hash_pair(HashAlgorithmTag::Blake3, &l, &r);
        assert_eq!(a, b);
        assert_ne!(a, hash_pair(HashAlgorithmTag::Sha256, &l, &r));
    }
}
