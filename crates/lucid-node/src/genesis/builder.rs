//! Builds the height-0 block that seeds the anchoring chain: no
//! transactions, `previous_hash` all zero, and an initial validator
//! set carried alongside it so `lucid-15-consensus` can be constructed
//! with real stakes before the first session ever anchors.

use lucid_14_block_service::derive_block_id;
use lucid_15_consensus::ValidatorInfo;
use lucid_types::{Block, BlockHeader, BlockStatus, Hash, PublicKey};
use thiserror::Error;

/// Genesis construction errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("validator set is empty; at least one validator must back the chain")]
    NoValidators,
    #[error("validator {0:?} has zero stake")]
    ZeroStake(PublicKey),
}

/// Configuration for the genesis block and the validator set that
/// starts voting on top of it.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    /// Genesis timestamp (Unix seconds). `None` uses current time.
    pub timestamp: Option<u64>,
    /// Initial validators, each with its bonded stake.
    pub initial_validators: Vec<(PublicKey, u128)>,
    /// Block header format version stamped on every block this node produces.
    pub protocol_version: u16,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self { timestamp: None, initial_validators: Vec::new(), protocol_version: 1 }
    }
}

impl GenesisConfig {
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.initial_validators.is_empty() {
            return Err(GenesisError::NoValidators);
        }
        for (id, stake) in &self.initial_validators {
            if *stake == 0 {
                return Err(GenesisError::ZeroStake(*id));
            }
        }
        Ok(())
    }
}

/// The genesis block plus the validator roster it was built against.
pub struct Genesis {
    pub block: Block,
    pub validators: Vec<ValidatorInfo>,
}

/// Builds a genesis block from a validated [`GenesisConfig`].
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    #[must_use]
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Genesis, GenesisError> {
        self.config.validate()?;

        let timestamp = self.config.timestamp.unwrap_or_else(lucid_types::now_unix);
        let header = BlockHeader {
            version: self.config.protocol_version,
            height: 0,
            previous_hash: Block::ZERO_HASH,
            merkle_root: Block::ZERO_HASH,
            timestamp,
            nonce: 0,
        };
        let id = derive_block_id(&header);

        let block = Block {
            id,
            header,
            status: BlockStatus::Confirmed,
            transactions: Vec::new(),
            session_anchor_ids: Vec::new(),
            consensus: None,
            size_bytes: 0,
            confirmation_count: 0,
        };

        let validators = self
            .config
            .initial_validators
            .iter()
            .map(|(id, stake)| ValidatorInfo { id: *id, stake: *stake, active: true })
            .collect();

        Ok(Genesis { block, validators })
    }
}

/// Derives a deterministic single-validator devnet genesis: one
/// validator, identified by `validator_id`, holding all stake.
#[must_use]
pub fn devnet(validator_id: PublicKey) -> GenesisConfig {
    GenesisConfig { initial_validators: vec![(validator_id, 1)], ..GenesisConfig::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_height_zero_and_zero_previous_hash() {
        let genesis = GenesisBuilder::new(devnet([7u8; 32])).build().unwrap();
        assert_eq!(genesis.block.header.height, 0);
        assert_eq!(genesis.block.header.previous_hash, Block::ZERO_HASH);
        assert_eq!(genesis.validators.len(), 1);
    }

    #[test]
    fn genesis_hash_is_deterministic_for_a_fixed_timestamp() {
        let config = GenesisConfig { timestamp: Some(1_700_000_000), ..devnet([1u8; 32]) };
        let a = GenesisBuilder::new(config.clone()).build().unwrap();
        let b = GenesisBuilder::new(config).build().unwrap();
        assert_eq!(a.block.id, b.block.id);
    }

    #[test]
    fn empty_validator_set_is_rejected() {
        let config = GenesisConfig::default();
        assert!(matches!(config.validate(), Err(GenesisError::NoValidators)));
    }

    #[test]
    fn a_zero_stake_validator_is_rejected() {
        let config = GenesisConfig { initial_validators: vec![([1u8; 32], 0)], ..GenesisConfig::default() };
        assert!(matches!(config.validate(), Err(GenesisError::ZeroStake(_))));
    }
}
