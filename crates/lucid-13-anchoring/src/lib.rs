//! # Anchoring & Merkle Proof Services
//!
//! Ingests finished session manifests, submits idempotent
//! manifest-hash-derived session-anchor transactions, tracks them to
//! confirmation, and serves Merkle inclusion proofs against whatever
//! root a session was anchored under (spec.md §4.9).

#![warn(missing_docs)]
#![allow(missing_docs)]

mod anchoring;
mod errors;
mod ports;
mod proof_service;

pub use anchoring::{derive_transaction_id, AnchoringService, DEFAULT_REQUIRED_CONFIRMATIONS};
pub use errors::{AnchorError, ProofError};
pub use ports::{InMemoryMempool, MempoolPort};
pub use proof_service::{AnchoredProof, MerkleProofService};
