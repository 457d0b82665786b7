//! Outbound ports the Coordinator drives but does not implement itself.
//! Concrete adapters (RocksDB chunk store, the real Anchoring Service
//! client) are wired in by `lucid-node`; tests use the in-memory fakes
//! below.

use async_trait::async_trait;
use lucid_types::{Hash, SessionId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable storage for chunk ciphertext. One write per chunk; chunks
/// are never mutated after `stored`.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persists `ciphertext` for `(session_id, index)` and returns a
    /// durable storage locator.
    async fn store(
        &self,
        session_id: SessionId,
        index: u64,
        ciphertext: &[u8],
    ) -> Result<String, String>;
}

/// What the Coordinator hands to the Anchoring Service once a
/// session's manifest is ready. The real adapter submits a
/// session-anchor transaction; the in-memory fake just records calls.
#[async_trait]
pub trait AnchorPort: Send + Sync {
    /// Submits a manifest for anchoring. Returns the transaction id
    /// (manifest-hash-derived, so resubmission coalesces).
    async fn submit_manifest(&self, manifest: lucid_types::SessionManifest) -> Hash;
}

/// In-memory chunk store for tests and single-node fixtures.
#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: Mutex<HashMap<(SessionId, u64), Vec<u8>>>,
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn store(
        &self,
        session_id: SessionId,
        index: u64,
        ciphertext: &[u8],
    ) -> Result<String, String> {
        let locator = format!("mem://{session_id}/{index}");
        self.chunks
            .lock()
            .unwrap()
            .insert((session_id, index), ciphertext.to_vec());
        Ok(locator)
    }
}

/// Records every manifest submitted to it; does not simulate chain
/// confirmation. Pair with `PipelineCoordinator::anchor_confirmed` in
/// tests that exercise the full ANCHORING -> COMPLETED transition.
#[derive(Default)]
pub struct RecordingAnchorPort {
    pub submitted: Mutex<Vec<lucid_types::SessionManifest>>,
}

#[async_trait]
impl AnchorPort for RecordingAnchorPort {
    async fn submit_manifest(&self, manifest: lucid_types::SessionManifest) -> Hash {
        let hash = manifest.hash();
        self.submitted.lock().unwrap().push(manifest);
        hash
    }
}
