//! `AnchoringService`: submits finished session manifests as
//! session-anchor transactions and tracks them to confirmation
//! (spec.md §4.9).

use crate::errors::AnchorError;
use crate::ports::MempoolPort;
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_types::{
    now_unix, BlockchainAnchor, Hash, HashAlgorithm, SessionAnchorPayload, SessionId,
    SessionManifest, Transaction, TransactionStatus, TransactionType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Confirmations required before a submission is considered final.
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u32 = 12;

pub(crate) struct AnchorState {
    pub session_id: SessionId,
    pub merkle_root: Hash,
    pub chunk_hashes: Vec<Hash>,
    pub algorithm: HashAlgorithm,
    pub transaction_id: Hash,
    pub status: TransactionStatus,
    pub block_id: Option<Hash>,
    pub block_height: Option<u64>,
    pub confirmation_count: u32,
}

/// Derives a session-anchor transaction id purely from the manifest
/// hash, so resubmitting the same manifest always coalesces onto the
/// same id (spec.md §4.9's idempotency rule).
#[must_use]
pub fn derive_transaction_id(manifest_hash: Hash) -> Hash {
    lucid_crypto::hashing::blake3_hash_many(&[&b"lucid-session-anchor"[..], &manifest_hash[..]])
}

pub struct AnchoringService {
    bus: Arc<dyn EventPublisher>,
    mempool: Arc<dyn MempoolPort>,
    required_confirmations: u32,
    submissions: RwLock<HashMap<Hash, AnchorState>>,
}

impl AnchoringService {
    #[must_use]
    pub fn new(bus: Arc<dyn EventPublisher>, mempool: Arc<dyn MempoolPort>) -> Self {
        Self {
            bus,
            mempool,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
            submissions: RwLock::new(HashMap::new()),
        }
    }

    async fn publish(&self, event: LucidEvent) {
        self.bus.publish(event).await;
    }

    /// Submits a finished session's manifest as a session-anchor
    /// transaction. Submitting the same manifest twice (same
    /// `manifest.hash()`) returns the same transaction id without
    /// touching the mempool again.
    pub async fn submit_manifest(
        &self,
        manifest: &SessionManifest,
        algorithm: HashAlgorithm,
        owner: String,
    ) -> Result<Hash, AnchorError> {
        let manifest_hash = manifest.hash();

        if let Some(existing) = self.submissions.read().await.get(&manifest_hash) {
            return Ok(existing.transaction_id);
        }

        let transaction_id = derive_transaction_id(manifest_hash);
        let payload = SessionAnchorPayload {
            session_id: manifest.session_id,
            owner,
            merkle_root: manifest.merkle_root,
            chunk_count: manifest.total_chunks,
            total_size_bytes: manifest.total_size_bytes,
            manifest_hash,
        };
        let transaction = Transaction {
            id: transaction_id,
            tx_type: TransactionType::SessionAnchor,
            payload: serde_json::to_vec(&payload).expect("anchor payload always serializes"),
            submitted_at: now_unix(),
            signature: [0u8; 64],
            block_hash: None,
            confirmation_count: 0,
            status: TransactionStatus::Pending,
        };

        self.mempool.submit(transaction).await.map_err(AnchorError::MempoolRejected)?;

        self.submissions.write().await.insert(
            manifest_hash,
            AnchorState {
                session_id: manifest.session_id,
                merkle_root: manifest.merkle_root,
                chunk_hashes: manifest.chunk_hashes.clone(),
                algorithm,
                transaction_id,
                status: TransactionStatus::Pending,
                block_id: None,
                block_height: None,
                confirmation_count: 0,
            },
        );

        self.publish(LucidEvent::AnchorSubmitted { session_id: manifest.session_id, transaction_id }).await;
        Ok(transaction_id)
    }

    /// The chain reports the transaction landed in a block.
    pub async fn mark_included(&self, manifest_hash: Hash, block_id: Hash, block_height: u64) -> Result<(), AnchorError> {
        let mut submissions = self.submissions.write().await;
        let state = submissions.get_mut(&manifest_hash).ok_or(AnchorError::NotFound(manifest_hash))?;
        state.status = TransactionStatus::Included;
        state.block_id = Some(block_id);
        state.block_height = Some(block_height);
        Ok(())
    }

    /// Applies a fresh confirmation count; returns the finished
    /// `BlockchainAnchor` the instant the threshold is first reached.
    pub async fn record_confirmation(
        &self,
        manifest_hash: Hash,
        confirmation_count: u32,
    ) -> Result<Option<BlockchainAnchor>, AnchorError> {
        let mut submissions = self.submissions.write().await;
        let state = submissions.get_mut(&manifest_hash).ok_or(AnchorError::NotFound(manifest_hash))?;
        state.confirmation_count = confirmation_count;

        if state.status == TransactionStatus::Confirmed || confirmation_count < self.required_confirmations {
            return Ok(None);
        }

        state.status = TransactionStatus::Confirmed;
        let anchor = BlockchainAnchor {
            block_height: state.block_height.unwrap_or(0),
            block_id: state.block_id.unwrap_or(lucid_types::Block::ZERO_HASH),
            transaction_id: state.transaction_id,
            merkle_root: state.merkle_root,
            anchored_at: now_unix(),
            confirmation_count,
            verified: true,
        };
        let session_id = state.session_id;
        drop(submissions);

        self.publish(LucidEvent::AnchorConfirmed {
            session_id,
            block_height: anchor.block_height,
            confirmation_count,
        })
        .await;
        Ok(Some(anchor))
    }

    pub(crate) async fn leaves_for(&self, manifest_hash: Hash) -> Option<(Vec<Hash>, HashAlgorithm)> {
        self.submissions
            .read()
            .await
            .get(&manifest_hash)
            .map(|s| (s.chunk_hashes.clone(), s.algorithm))
    }

    pub(crate) async fn anchor_location(&self, manifest_hash: Hash) -> Option<(Option<Hash>, Option<u64>)> {
        self.submissions.read().await.get(&manifest_hash).map(|s| (s.block_id, s.block_height))
    }
}
