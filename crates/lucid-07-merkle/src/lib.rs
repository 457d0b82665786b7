//! # Merkle Tree Builder & Proof Service
//!
//! Builds a session's Merkle tree over its chunk ciphertext hashes as
//! they become available, using the pairwise promote-odd-node rule: an
//! odd node at a level is promoted unchanged rather than duplicated.
//! Finalizes into an immutable tree exposing `(root, leaf_count,
//! height)` plus inclusion-proof generation, and a standalone verifier
//! that needs only a root and a proof.
//!
//! Leaf hashing and batch verification of the hashes feeding this
//! builder run on the worker pool in `lucid-compute`; this crate owns
//! only the tree shape and proof math.

pub mod builder;
pub mod errors;
pub mod proof;

pub use builder::{FinalizedMerkleTree, MerkleBuilder};
pub use errors::MerkleError;
pub use proof::{verify, InclusionProof};
