//! Pure block validation checklist (spec.md §4.9, points 1-6). No I/O:
//! callers supply the candidate block, its parent (if height > 0), and
//! a config; every check is a plain function over those values.

use crate::errors::BlockValidationError;
use lucid_07_merkle::MerkleBuilder;
use lucid_types::{Block, Hash, HashAlgorithm, Transaction};

/// Tunables for the timestamp-skew and merkle-recompute checks.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub max_future_drift_secs: u64,
    pub max_past_drift_secs: u64,
    pub merkle_algorithm: HashAlgorithm,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_future_drift_secs: 15, max_past_drift_secs: 3600, merkle_algorithm: HashAlgorithm::Blake3 }
    }
}

/// Check 1: required fields present, lengths correct.
pub fn validate_structure(block: &Block) -> Result<(), BlockValidationError> {
    if block.header.height > 0 && block.transactions.is_empty() && block.session_anchor_ids.is_empty() {
        return Err(BlockValidationError::EmptyStructure(block.id));
    }
    Ok(())
}

/// Check 2: timestamp within an acceptable skew of the parent block.
/// Genesis (no parent) is always accepted. Only monotonicity against
/// the parent is checked here; drift against wall-clock now is a
/// separate check (`skew_against_now`) since a block can be validated
/// long after it was produced.
pub fn validate_timestamp(block: &Block, parent: Option<&Block>) -> Result<(), BlockValidationError> {
    let Some(parent) = parent else { return Ok(()) };
    let parent_timestamp = parent.header.timestamp;
    let timestamp = block.header.timestamp;

    if timestamp < parent_timestamp {
        return Err(BlockValidationError::TimestampSkew { timestamp, parent_timestamp, max_drift_secs: 0 });
    }
    Ok(())
}

fn skew_against_now(block: &Block, now: u64, config: &ValidationConfig) -> Result<(), BlockValidationError> {
    let timestamp = block.header.timestamp;
    if timestamp > now.saturating_add(config.max_future_drift_secs) {
        return Err(BlockValidationError::TimestampSkew {
            timestamp,
            parent_timestamp: now,
            max_drift_secs: config.max_future_drift_secs,
        });
    }
    if now.saturating_sub(timestamp) > config.max_past_drift_secs && block.header.height > 0 {
        return Err(BlockValidationError::TimestampSkew {
            timestamp,
            parent_timestamp: now,
            max_drift_secs: config.max_past_drift_secs,
        });
    }
    Ok(())
}

/// Check 3: the merkle root over the transaction list matches the
/// declared root, recomputed leaf-by-leaf over transaction ids.
pub fn validate_merkle_root(block: &Block, config: &ValidationConfig) -> Result<(), BlockValidationError> {
    if block.transactions.is_empty() {
        return if block.header.merkle_root == Block::ZERO_HASH {
            Ok(())
        } else {
            Err(BlockValidationError::MerkleMismatch)
        };
    }

    let mut builder = MerkleBuilder::new(config.merkle_algorithm);
    for tx in &block.transactions {
        builder.append(tx.id);
    }
    let tree = builder.finalize(block.header.timestamp).map_err(|_| BlockValidationError::MerkleMismatch)?;
    if tree.root() == block.header.merkle_root {
        Ok(())
    } else {
        Err(BlockValidationError::MerkleMismatch)
    }
}

/// Check 4: every transaction validates in isolation (non-empty
/// payload, a transaction id consistent with its own content).
pub fn validate_transaction(tx: &Transaction) -> Result<(), String> {
    if tx.payload.is_empty() {
        return Err("transaction payload is empty".into());
    }
    if tx.id == [0u8; 32] {
        return Err("transaction id is the zero hash".into());
    }
    Ok(())
}

pub fn validate_transactions(block: &Block) -> Result<(), BlockValidationError> {
    for tx in &block.transactions {
        validate_transaction(tx).map_err(|reason| BlockValidationError::InvalidTransaction(tx.id, reason))?;
    }
    Ok(())
}

/// Check 5: previous-hash links to the parent's id. Genesis's
/// previous_hash must be the all-zero hash.
pub fn validate_previous_hash(block: &Block, parent: Option<&Block>) -> Result<(), BlockValidationError> {
    match parent {
        Some(parent) if block.header.previous_hash != parent.id => {
            Err(BlockValidationError::PreviousHashMismatch { expected: parent.id, got: block.header.previous_hash })
        }
        None if block.header.height == 0 && block.header.previous_hash != Block::ZERO_HASH => {
            Err(BlockValidationError::PreviousHashMismatch { expected: Block::ZERO_HASH, got: block.header.previous_hash })
        }
        _ => Ok(()),
    }
}

/// Check 6: block signature / consensus record is well-formed. A block
/// with a consensus record must have a vote set whose stake reaches
/// the record's own declared quorum.
pub fn validate_consensus(block: &Block) -> Result<(), BlockValidationError> {
    let Some(consensus) = &block.consensus else { return Ok(()) };
    if consensus.votes.is_empty() {
        return Err(BlockValidationError::MalformedConsensus("consensus record has no votes".into()));
    }
    if consensus.total_stake_voted < consensus.quorum_stake {
        return Err(BlockValidationError::MalformedConsensus(
            "total stake voted is below the record's own declared quorum".into(),
        ));
    }
    if consensus.votes.iter().any(|v| v.block_hash != block.id) {
        return Err(BlockValidationError::MalformedConsensus("a vote references a different block hash".into()));
    }
    Ok(())
}

/// Runs the full six-point checklist in order, short-circuiting on the
/// first failure (spec.md §4.9: only a block passing all six reaches
/// CONFIRMED on first inclusion).
pub fn validate_block(
    block: &Block,
    parent: Option<&Block>,
    now: u64,
    config: &ValidationConfig,
) -> Result<(), BlockValidationError> {
    validate_structure(block)?;
    validate_timestamp(block, parent)?;
    skew_against_now(block, now, config)?;
    validate_merkle_root(block, config)?;
    validate_transactions(block)?;
    validate_previous_hash(block, parent)?;
    validate_consensus(block)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_types::{BlockHeader, BlockStatus, TransactionStatus, TransactionType};

    fn tx(id: u8) -> Transaction {
        Transaction {
            id: [id; 32],
            tx_type: TransactionType::SessionAnchor,
            payload: vec![1, 2, 3],
            submitted_at: 1_000,
            signature: [0u8; 64],
            block_hash: None,
            confirmation_count: 0,
            status: TransactionStatus::Pending,
        }
    }

    fn block(height: u64, previous_hash: Hash, timestamp: u64, transactions: Vec<Transaction>) -> Block {
        let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
        for t in &transactions {
            builder.append(t.id);
        }
        let merkle_root = if transactions.is_empty() {
            Block::ZERO_HASH
        } else {
            builder.finalize(timestamp).unwrap().root()
        };

        Block {
            id: [height as u8 + 100; 32],
            header: BlockHeader { version: 1, height, previous_hash, merkle_root, timestamp, nonce: 0 },
            status: BlockStatus::Pending,
            transactions,
            session_anchor_ids: vec![],
            consensus: None,
            size_bytes: 128,
            confirmation_count: 0,
        }
    }

    #[test]
    fn genesis_with_zero_previous_hash_passes() {
        let genesis = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let config = ValidationConfig::default();
        assert!(validate_block(&genesis, None, 1_000, &config).is_ok());
    }

    #[test]
    fn genesis_with_nonzero_previous_hash_fails() {
        let genesis = block(0, [9u8; 32], 1_000, vec![tx(1)]);
        let config = ValidationConfig::default();
        assert!(matches!(
            validate_block(&genesis, None, 1_000, &config),
            Err(BlockValidationError::PreviousHashMismatch { .. })
        ));
    }

    #[test]
    fn mismatched_previous_hash_is_rejected() {
        let parent = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let child = block(1, [42u8; 32], 1_010, vec![tx(2)]);
        let config = ValidationConfig::default();
        assert!(matches!(
            validate_block(&child, Some(&parent), 1_010, &config),
            Err(BlockValidationError::PreviousHashMismatch { .. })
        ));
    }

    #[test]
    fn linked_block_with_correct_merkle_root_passes() {
        let parent = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let child = block(1, parent.id, 1_010, vec![tx(2), tx(3)]);
        let config = ValidationConfig::default();
        assert!(validate_block(&child, Some(&parent), 1_010, &config).is_ok());
    }

    #[test]
    fn tampered_merkle_root_is_rejected() {
        let parent = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let mut child = block(1, parent.id, 1_010, vec![tx(2), tx(3)]);
        child.header.merkle_root = [77u8; 32];
        let config = ValidationConfig::default();
        assert!(matches!(
            validate_block(&child, Some(&parent), 1_010, &config),
            Err(BlockValidationError::MerkleMismatch)
        ));
    }

    #[test]
    fn timestamp_too_far_in_the_future_is_rejected() {
        let parent = block(0, Block::ZERO_HASH, 1_000, vec![tx(1)]);
        let child = block(1, parent.id, 10_000, vec![tx(2)]);
        let config = ValidationConfig::default();
        assert!(matches!(
            validate_block(&child, Some(&parent), 1_010, &config),
            Err(BlockValidationError::TimestampSkew { .. })
        ));
    }

    #[test]
    fn empty_transaction_payload_fails_isolated_validation() {
        let mut bad = tx(5);
        bad.payload.clear();
        assert!(validate_transaction(&bad).is_err());
    }

    #[test]
    fn consensus_record_below_its_own_quorum_is_malformed() {
        use lucid_types::{ConsensusRecord, Vote};
        let mut b = block(1, [1u8; 32], 1_010, vec![tx(1)]);
        b.consensus = Some(ConsensusRecord {
            votes: vec![Vote { node_id: [1u8; 32], block_hash: b.id, approve: true, signature: [0u8; 64], timestamp: 1_010 }],
            total_stake_voted: 10,
            quorum_stake: 100,
        });
        assert!(matches!(validate_consensus(&b), Err(BlockValidationError::MalformedConsensus(_))));
    }
}
