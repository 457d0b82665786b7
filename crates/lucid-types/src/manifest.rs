//! The session manifest submitted to the Anchoring Service (spec.md §6).
//!
//! A manifest is the compact, hashable summary of a finished session:
//! identity, chunk count/size, the Merkle root, and the full ordered
//! list of chunk ciphertext hashes. Its hash (over the canonical
//! serialization: keys sorted lexicographically, no whitespace) is the
//! deterministic input to the session-anchor transaction id, so
//! resubmitting the same manifest always coalesces onto the same
//! transaction.

use crate::{Hash, Signature};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// The compact on-chain-anchor payload produced once a session reaches
/// `FINALIZING` and its Merkle tree is built.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: crate::SessionId,
    pub user_id: String,
    pub created_at: u64,
    pub total_chunks: u64,
    pub total_size_bytes: u64,
    pub merkle_root: Hash,
    pub chunk_hashes: Vec<Hash>,
    pub metadata: serde_json::Value,
    #[serde_as(as = "Option<Bytes>")]
    pub signature: Option<Signature>,
}

/// A field ordering wrapper whose `Serialize` impl is the canonical
/// form spec.md §6 requires: lexicographically sorted keys, no
/// whitespace. `serde_json::to_vec` already emits struct fields in
/// declaration order with no whitespace, so canonicalization only
/// needs to fix key order - done here by routing through a `BTreeMap`.
fn canonical_bytes(manifest: &SessionManifest) -> Vec<u8> {
    let value = serde_json::to_value(manifest).expect("manifest always serializes");
    let canonical: std::collections::BTreeMap<String, serde_json::Value> = match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => unreachable!("SessionManifest always serializes to a JSON object"),
    };
    serde_json::to_vec(&canonical).expect("canonical map always serializes")
}

impl SessionManifest {
    /// The manifest hash used to derive the session-anchor transaction
    /// id. Idempotent: two serializations of the same manifest yield
    /// the same hash, so duplicate submissions coalesce.
    #[must_use]
    pub fn hash(&self) -> Hash {
        blake3_hash(&canonical_bytes(self))
    }
}

fn blake3_hash(bytes: &[u8]) -> Hash {
    *blake3::hash(bytes).as_bytes()
}
