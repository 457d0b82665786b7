//! # Session Pipeline Coordinator
//!
//! The single owner of a session's lifetime (spec.md §4.4). Every other
//! leaf component - capture, chunk assembly, compression, encryption,
//! Merkle building, durable storage, anchoring - is driven by this
//! crate or reports into it through the event bus; nothing else is
//! allowed to mutate a [`lucid_types::Session`].

#![warn(missing_docs)]
#![allow(missing_docs)]

mod coordinator;
mod errors;
mod ports;
mod state;

pub use coordinator::{PipelineConfig, PipelineCoordinator};
pub use errors::PipelineError;
pub use ports::{AnchorPort, ChunkStore, InMemoryChunkStore, RecordingAnchorPort};
pub use state::is_legal_transition;

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_bus::InMemoryEventBus;
    use lucid_crypto::Cipher;
    use lucid_05_compression::Compressor;
    use lucid_types::{CapabilityWhitelist, FileTransferCapability, Policy, SessionState};
    use std::sync::Arc;

    fn default_policy(free: bool) -> Policy {
        Policy {
            default_deny: true,
            capabilities: CapabilityWhitelist {
                input: true,
                clipboard: false,
                file_transfer: FileTransferCapability {
                    allowed: false,
                    path_prefixes: Vec::new(),
                },
                application_allow_list: Vec::new(),
            },
            privacy_shield: Default::default(),
            policy_hash: [0u8; 32],
            owner_signature: [0u8; 64],
            version: 1,
            created_by: [0u8; 32],
            free_session: free,
        }
    }

    fn coordinator() -> PipelineCoordinator {
        let bus = Arc::new(InMemoryEventBus::new());
        let compressor = Compressor::new(lucid_compute::auto_detect().unwrap());
        let chunk_store = Arc::new(InMemoryChunkStore::default());
        let anchor = Arc::new(RecordingAnchorPort::default());
        PipelineCoordinator::new(
            bus,
            compressor,
            Cipher::XChaCha20Poly1305,
            chunk_store,
            anchor,
            PipelineConfig::default(),
        )
        .unwrap()
    }

    fn chunk(index: u64, payload: &[u8]) -> lucid_04_chunk_assembler::AssembledChunk {
        lucid_04_chunk_assembler::AssembledChunk {
            index,
            descriptors: Vec::new(),
            bytes: payload.to_vec(),
        }
    }

    #[tokio::test]
    async fn happy_path_anchors_a_three_chunk_session() {
        let coord = coordinator();
        let id = coord.create_session(default_policy(false)).await;
        assert_eq!(coord.snapshot(id).await.unwrap().state, SessionState::Pending);

        coord.note_payment_confirmed(id).await.unwrap();
        coord.rdp_handshake_ok(id, "owner-1".into()).await.unwrap();
        assert_eq!(coord.snapshot(id).await.unwrap().state, SessionState::Recording);

        for i in 0..3u64 {
            coord.ingest_chunk(id, chunk(i, b"frame bytes")).await.unwrap();
        }
        let session = coord.snapshot(id).await.unwrap();
        assert_eq!(session.chunks.len(), 3);

        let manifest = coord.capture_eof(id).await.unwrap();
        assert_eq!(manifest.total_chunks, 3);
        assert_eq!(coord.snapshot(id).await.unwrap().state, SessionState::Anchoring);

        let anchor = lucid_types::BlockchainAnchor {
            block_height: 10,
            block_id: [1u8; 32],
            transaction_id: manifest.hash(),
            merkle_root: manifest.merkle_root,
            anchored_at: lucid_types::now_unix(),
            confirmation_count: 19,
            verified: true,
        };
        coord.anchor_confirmed(id, anchor).await.unwrap();
        assert_eq!(coord.snapshot(id).await.unwrap().state, SessionState::Completed);
    }

    #[tokio::test]
    async fn free_session_skips_the_payment_gate() {
        let coord = coordinator();
        let id = coord.create_session(default_policy(true)).await;
        assert_eq!(coord.snapshot(id).await.unwrap().state, SessionState::Ready);
    }

    #[tokio::test]
    async fn out_of_order_chunk_index_is_rejected() {
        let coord = coordinator();
        let id = coord.create_session(default_policy(true)).await;
        coord.rdp_handshake_ok(id, "owner-1".into()).await.unwrap();

        let err = coord.ingest_chunk(id, chunk(1, b"skip ahead")).await.unwrap_err();
        assert!(matches!(err, PipelineError::ChunkIndexGap { expected: 0, got: 1, .. }));
    }

    #[tokio::test]
    async fn cancelling_during_recording_flushes_trailing_bytes_without_anchoring() {
        let coord = coordinator();
        let id = coord.create_session(default_policy(true)).await;
        coord.rdp_handshake_ok(id, "owner-1".into()).await.unwrap();
        coord.ingest_chunk(id, chunk(0, b"first chunk")).await.unwrap();

        let manifest = coord
            .cancel_during_recording(id, Some(b"trailing bytes".to_vec()))
            .await
            .unwrap();

        assert_eq!(manifest.total_chunks, 2);
        let session = coord.snapshot(id).await.unwrap();
        assert_eq!(session.state, SessionState::Cancelled);
        assert_eq!(session.chunks.len(), 2);
    }

    #[tokio::test]
    async fn anchor_timeout_fails_but_keeps_the_merkle_root_in_the_audit_log() {
        let coord = coordinator();
        let id = coord.create_session(default_policy(true)).await;
        coord.rdp_handshake_ok(id, "owner-1".into()).await.unwrap();
        coord.ingest_chunk(id, chunk(0, b"only chunk")).await.unwrap();
        coord.capture_eof(id).await.unwrap();

        coord.anchor_timeout(id).await.unwrap();
        let session = coord.snapshot(id).await.unwrap();
        assert_eq!(session.state, SessionState::Failed);
        assert!(session.merkle_tree.is_some());
        assert!(session
            .audit_log
            .iter()
            .any(|e| e.kind == "failed" && e.detail.contains("merkle_root=")));
    }
}
