//! # Lucid Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305, ChaCha20-Poly1305, AES-256-GCM | Chunk ciphertext |
//! | `hashing` | BLAKE3, SHA-256 | Chunk digests, Merkle leaves/nodes |
//! | `signatures` | Ed25519 | Validator votes, policy signing, onion service keys |
//!
//! ## Security Properties
//!
//! - **XChaCha20-Poly1305**: 192-bit nonce, constant-time, side-channel immune.
//! - **Ed25519**: deterministic nonces, no RNG dependency.
//! - **BLAKE3**: SIMD-accelerated, default hash for Merkle trees.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;
pub mod symmetric;

pub use errors::CryptoError;
pub use hashing::{blake3_hash, hash_pair, sha256_hash, Blake3Hasher, HashAlgorithmTag};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use symmetric::{decrypt, encrypt, Cipher, Nonce, SecretKey};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
