//! # Anchoring Choreography
//!
//! Exercises the full chain leg of spec.md §4.9 without `lucid-node`'s
//! wiring: a session manifest is submitted to the Anchoring Service,
//! its session-anchor transaction is carried inside a block that
//! clears PoOT quorum, and once that block is marked included and
//! confirmed, the Merkle Proof Service still serves a valid inclusion
//! proof against the manifest's root.

#[cfg(test)]
mod tests {
    use lucid_07_merkle::MerkleBuilder;
    use lucid_13_anchoring::{AnchoringService, InMemoryMempool, MerkleProofService};
    use lucid_14_block_service::{derive_block_id, BlockService, InMemoryBlockStore, ValidationConfig};
    use lucid_15_consensus::{ConsensusConfig, ConsensusService, ValidatorInfo, ValidatorSet};
    use lucid_bus::{EventPublisher, InMemoryEventBus};
    use lucid_types::{
        now_unix, Block, BlockHeader, BlockStatus, Hash, HashAlgorithm, SessionAnchorPayload, SessionId,
        SessionManifest, Transaction, TransactionStatus, TransactionType, Vote,
    };
    use std::sync::Arc;

    fn three_validators() -> ValidatorSet {
        ValidatorSet::new(
            0,
            vec![
                ValidatorInfo { id: [1u8; 32], stake: 100, active: true },
                ValidatorInfo { id: [2u8; 32], stake: 100, active: true },
                ValidatorInfo { id: [3u8; 32], stake: 100, active: true },
            ],
        )
    }

    fn vote(node: u8, block_id: Hash, approve: bool, timestamp: u64) -> Vote {
        Vote { node_id: [node; 32], block_hash: block_id, approve, signature: [0u8; 64], timestamp }
    }

    fn session_manifest(total_chunks: u64) -> SessionManifest {
        let chunk_hashes: Vec<Hash> = (0..total_chunks).map(|i| [i as u8 + 1; 32]).collect();
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for h in &chunk_hashes {
            builder.append(*h);
        }
        let root = builder.finalize(0).unwrap().root();

        SessionManifest {
            session_id: SessionId::new(),
            user_id: "owner-e2e".into(),
            created_at: now_unix(),
            total_chunks,
            total_size_bytes: total_chunks * 4096,
            merkle_root: root,
            chunk_hashes,
            metadata: serde_json::json!({}),
            signature: None,
        }
    }

    fn block_carrying(height: u64, previous_hash: Hash, timestamp: u64, transaction: Transaction) -> Block {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        builder.append(transaction.id);
        let merkle_root = builder.finalize(timestamp).unwrap().root();
        let header = BlockHeader { version: 1, height, previous_hash, merkle_root, timestamp, nonce: 0 };
        let id = derive_block_id(&header);
        Block {
            id,
            header,
            status: BlockStatus::Pending,
            transactions: vec![transaction],
            session_anchor_ids: vec![],
            consensus: None,
            size_bytes: 64,
            confirmation_count: 0,
        }
    }

    #[tokio::test]
    async fn a_session_anchor_clears_quorum_and_still_proves_inclusion_afterward() {
        let bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());
        let blocks = Arc::new(BlockService::new(
            bus.clone(),
            Arc::new(InMemoryBlockStore::new()),
            ValidationConfig::default(),
        ));
        let consensus = ConsensusService::new(bus.clone(), blocks.clone(), three_validators(), ConsensusConfig::default());
        let anchoring = Arc::new(AnchoringService::new(bus.clone(), Arc::new(InMemoryMempool::new())));
        let proofs = MerkleProofService::new(anchoring.clone());

        let manifest = session_manifest(4);
        let manifest_hash = manifest.hash();
        let transaction_id = anchoring
            .submit_manifest(&manifest, HashAlgorithm::Blake3, "owner-e2e".into())
            .await
            .unwrap();

        let payload = SessionAnchorPayload {
            session_id: manifest.session_id,
            owner: "owner-e2e".into(),
            merkle_root: manifest.merkle_root,
            chunk_count: manifest.total_chunks,
            total_size_bytes: manifest.total_size_bytes,
            manifest_hash,
        };
        let transaction = Transaction {
            id: transaction_id,
            tx_type: TransactionType::SessionAnchor,
            payload: serde_json::to_vec(&payload).unwrap(),
            submitted_at: now_unix(),
            signature: [0u8; 64],
            block_hash: None,
            confirmation_count: 0,
            status: TransactionStatus::Pending,
        };

        let block = block_carrying(0, Block::ZERO_HASH, 1_000, transaction);
        let block_id = block.id;
        consensus.propose(block, [9u8; 32]).await.unwrap();
        consensus.cast_vote(vote(1, block_id, true, 1_000), 1_000).await.unwrap();
        consensus.cast_vote(vote(2, block_id, true, 1_000), 1_000).await.unwrap();
        let confirmed = consensus.cast_vote(vote(3, block_id, true, 1_000), 1_000).await.unwrap();
        assert!(confirmed);

        let stored = blocks.get_by_id(block_id).await.unwrap();
        assert_eq!(stored.status, BlockStatus::Confirmed);

        anchoring.mark_included(manifest_hash, block_id, 0).await.unwrap();
        let anchor = anchoring.record_confirmation(manifest_hash, 12).await.unwrap();
        assert!(anchor.is_some(), "12 confirmations should clear the default threshold");

        let proof = proofs.prove_by_index(manifest_hash, 0).await.unwrap();
        assert!(lucid_07_merkle::verify(proof.root, manifest.chunk_hashes[0], &proof.proof));
        assert_eq!(proof.block_id, Some(block_id));
    }

    #[tokio::test]
    async fn confirmations_below_the_threshold_never_produce_an_anchor() {
        let bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());
        let anchoring = Arc::new(AnchoringService::new(bus, Arc::new(InMemoryMempool::new())));
        let manifest = session_manifest(2);
        let manifest_hash = manifest.hash();
        anchoring.submit_manifest(&manifest, HashAlgorithm::Blake3, "owner-e2e".into()).await.unwrap();
        anchoring.mark_included(manifest_hash, [7u8; 32], 0).await.unwrap();

        let anchor = anchoring.record_confirmation(manifest_hash, 1).await.unwrap();
        assert!(anchor.is_none());
    }

    #[tokio::test]
    async fn resubmitting_a_manifest_after_it_anchored_is_a_no_op() {
        let bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());
        let anchoring = Arc::new(AnchoringService::new(bus, Arc::new(InMemoryMempool::new())));
        let manifest = session_manifest(1);

        let first = anchoring.submit_manifest(&manifest, HashAlgorithm::Blake3, "owner-e2e".into()).await.unwrap();
        let second = anchoring.submit_manifest(&manifest, HashAlgorithm::Blake3, "owner-e2e".into()).await.unwrap();
        assert_eq!(first, second);
    }
}
