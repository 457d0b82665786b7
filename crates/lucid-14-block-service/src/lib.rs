//! # Block Service
//!
//! Block queries (by id, by height, latest, range, by-session-anchor)
//! and the six-point block validation checklist that gates a proposed
//! block's admission to CONFIRMED (spec.md §4.9).

mod block_id;
mod errors;
mod service;
mod store;
mod validation;

pub use block_id::derive_block_id;
pub use errors::{BlockServiceError, BlockValidationError};
pub use service::BlockService;
pub use store::{BlockStorePort, InMemoryBlockStore};
pub use validation::{validate_block, ValidationConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_07_merkle::MerkleBuilder;
    use lucid_bus::InMemoryEventBus;
    use lucid_types::{Block, BlockHeader, BlockStatus, HashAlgorithm, Transaction, TransactionStatus, TransactionType};
    use std::sync::Arc;

    fn tx(id: u8) -> Transaction {
        Transaction {
            id: [id; 32],
            tx_type: TransactionType::SessionAnchor,
            payload: vec![1],
            submitted_at: 1_000,
            signature: [0u8; 64],
            block_hash: None,
            confirmation_count: 0,
            status: TransactionStatus::Pending,
        }
    }

    fn block(height: u64, previous_hash: [u8; 32], timestamp: u64, transactions: Vec<Transaction>) -> Block {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for t in &transactions {
            builder.append(t.id);
        }
        let merkle_root =
            if transactions.is_empty() { Block::ZERO_HASH } else { builder.finalize(timestamp).unwrap().root() };
        let header = BlockHeader { version: 1, height, previous_hash, merkle_root, timestamp, nonce: 0 };
        let id = derive_block_id(&header);
        Block {
            id,
            header,
            status: BlockStatus::Pending,
            transactions,
            session_anchor_ids: vec![],
            consensus: None,
            size_bytes: 64,
            confirmation_count: 0,
        }
    }

    fn service() -> BlockService {
        BlockService::new(Arc::new(InMemoryEventBus::new()), Arc::new(InMemoryBlockStore::new()), ValidationConfig::default())
    }

    #[tokio::test]
    async fn admitting_genesis_then_querying_it_back_by_id_and_height() {
        let svc = service();
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let id = genesis.id;
        svc.admit(genesis, 1_000).await.unwrap();

        let by_id = svc.get_by_id(id).await.unwrap();
        assert_eq!(by_id.status, BlockStatus::Confirmed);
        let by_height = svc.get_by_height(0).await.unwrap();
        assert_eq!(by_height.id, id);
    }

    #[tokio::test]
    async fn admitting_a_broken_chain_link_is_rejected_and_never_stored() {
        let svc = service();
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        svc.admit(genesis, 1_000).await.unwrap();

        let orphan = block(1, [9u8; 32], 1_010, vec![tx(2)]);
        let err = svc.admit(orphan, 1_010).await.unwrap_err();
        assert!(matches!(err, BlockValidationError::PreviousHashMismatch { .. }));
        assert!(svc.get_by_height(1).await.is_err());
    }

    #[tokio::test]
    async fn latest_tracks_the_highest_admitted_block() {
        let svc = service();
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let genesis_id = genesis.id;
        svc.admit(genesis, 1_000).await.unwrap();
        let child = block(1, genesis_id, 1_010, vec![tx(2)]);
        let child_id = child.id;
        svc.admit(child, 1_010).await.unwrap();

        assert_eq!(svc.latest().await.unwrap().id, child_id);
    }

    #[tokio::test]
    async fn range_returns_every_block_in_the_inclusive_span() {
        let svc = service();
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let genesis_id = genesis.id;
        svc.admit(genesis, 1_000).await.unwrap();
        let child = block(1, genesis_id, 1_010, vec![tx(2)]);
        svc.admit(child, 1_010).await.unwrap();

        let blocks = svc.range(0, 1).await;
        assert_eq!(blocks.len(), 2);
    }

    #[tokio::test]
    async fn session_anchor_transactions_are_queryable_by_anchor_id() {
        let svc = service();
        let mut genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        genesis.session_anchor_ids = vec![[1u8; 32]];
        let id = genesis.id;
        svc.admit(genesis, 1_000).await.unwrap();

        let found = svc.by_session_anchor([1u8; 32]).await.unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn set_status_moves_a_confirmed_block_to_finalized() {
        let svc = service();
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let id = genesis.id;
        svc.admit(genesis, 1_000).await.unwrap();

        svc.set_status(id, 0, BlockStatus::Finalized).await;
        assert_eq!(svc.get_by_id(id).await.unwrap().status, BlockStatus::Finalized);
    }
}
