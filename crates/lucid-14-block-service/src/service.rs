//! `BlockService`: block queries and the block validation operation
//! (spec.md §4.9). Owns no consensus logic of its own; it is the
//! boundary consensus calls once it has a fully formed block to admit.

use crate::errors::{BlockServiceError, BlockValidationError};
use crate::store::BlockStorePort;
use crate::validation::{self, ValidationConfig};
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_types::{Block, BlockStatus, Hash};
use std::sync::Arc;

pub struct BlockService {
    bus: Arc<dyn EventPublisher>,
    store: Arc<dyn BlockStorePort>,
    config: ValidationConfig,
}

impl BlockService {
    #[must_use]
    pub fn new(bus: Arc<dyn EventPublisher>, store: Arc<dyn BlockStorePort>, config: ValidationConfig) -> Self {
        Self { bus, store, config }
    }

    pub async fn get_by_id(&self, id: Hash) -> Result<Block, BlockServiceError> {
        self.store.get_by_id(id).await.ok_or(BlockServiceError::NotFoundById(id))
    }

    pub async fn get_by_height(&self, height: u64) -> Result<Block, BlockServiceError> {
        self.store.get_by_height(height).await.ok_or(BlockServiceError::NotFoundByHeight(height))
    }

    pub async fn latest(&self) -> Result<Block, BlockServiceError> {
        self.store.latest().await.ok_or(BlockServiceError::ChainEmpty)
    }

    pub async fn range(&self, start_height: u64, end_height: u64) -> Vec<Block> {
        self.store.range(start_height, end_height).await
    }

    pub async fn by_session_anchor(&self, session_anchor_id: Hash) -> Option<Block> {
        self.store.by_session_anchor(session_anchor_id).await
    }

    /// Runs the full six-point validation checklist against the
    /// current chain tip as parent (or no parent, for genesis).
    pub async fn validate(&self, candidate: &Block, now: u64) -> Result<(), BlockValidationError> {
        let parent = if candidate.header.height == 0 {
            None
        } else {
            self.store.get_by_height(candidate.header.height - 1).await
        };
        validation::validate_block(candidate, parent.as_ref(), now, &self.config)
    }

    /// Validates and, on success, admits the block as CONFIRMED and
    /// publishes the status transition. Only a block passing all six
    /// checks reaches CONFIRMED on first inclusion (spec.md §4.9).
    pub async fn admit(&self, mut candidate: Block, now: u64) -> Result<(), BlockValidationError> {
        self.validate(&candidate, now).await?;
        candidate.status = BlockStatus::Confirmed;
        let id = candidate.id;
        let height = candidate.header.height;
        self.store.put(candidate).await;
        self.bus.publish(LucidEvent::BlockStatusChanged { block_id: id, height, status: BlockStatus::Confirmed }).await;
        Ok(())
    }

    /// Moves an already-CONFIRMED block to FINALIZED or ORPHANED, as
    /// decided by consensus depth-finality / orphan rules.
    pub async fn set_status(&self, id: Hash, height: u64, status: BlockStatus) {
        self.store.set_status(id, status).await;
        self.bus.publish(LucidEvent::BlockStatusChanged { block_id: id, height, status }).await;
    }
}
