//! # Node Configuration
//!
//! Unified configuration for every subsystem this node boots.
//!
//! ## Security Requirements
//!
//! - `security.hmac_secret` MUST NOT be the default zero value in production
//! - `onion.tor_control_addr` MUST point at a real control port in production

use lucid_types::PublicKey;
use std::path::PathBuf;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub onion: OnionConfig,
    pub pipeline: PipelineConfig,
    pub payment: PaymentConfig,
    pub chain: ChainConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HMAC secret is the default zero value; set LUCID_HMAC_SECRET")]
    DefaultHmacSecret,
    #[error("no initial validators configured; the chain cannot reach quorum")]
    NoValidators,
}

impl NodeConfig {
    /// Validates the configuration is safe to run against a real Tor
    /// process and real counterparties, not just internally consistent.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.security.hmac_secret == [0u8; 32] {
            return Err(ConfigError::DefaultHmacSecret);
        }
        if self.chain.initial_validators.is_empty() {
            return Err(ConfigError::NoValidators);
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            onion: OnionConfig::default(),
            pipeline: PipelineConfig::default(),
            payment: PaymentConfig::default(),
            chain: ChainConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// RDP listener configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Local TCP port the onion service's target maps onto.
    pub rdp_listen_port: u16,
    pub rdp_listen_host: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { rdp_listen_port: 3389, rdp_listen_host: "127.0.0.1".to_string() }
    }
}

/// Onion Service Manager configuration.
#[derive(Debug, Clone)]
pub struct OnionConfig {
    /// Tor's control port, e.g. `"127.0.0.1:9051"`.
    pub tor_control_addr: String,
    pub registry_path: PathBuf,
    pub key_dir: PathBuf,
}

impl Default for OnionConfig {
    fn default() -> Self {
        Self {
            tor_control_addr: "127.0.0.1:9051".to_string(),
            registry_path: PathBuf::from("./data/onion_registry.json"),
            key_dir: PathBuf::from("./data/onion_keys"),
        }
    }
}

/// Session Pipeline Coordinator configuration, mirrored from
/// `lucid_08_session_pipeline::PipelineConfig` so the node's config
/// surface stays flat and serializable from one source.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cipher: lucid_crypto::Cipher,
    pub chunk_store_queue_capacity: usize,
    pub anchor_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cipher: lucid_crypto::Cipher::XChaCha20Poly1305,
            chunk_store_queue_capacity: 64,
            anchor_timeout_secs: 300,
        }
    }
}

/// Payment acceptance, processing, and validation configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub min_amount: f64,
    pub max_amount: f64,
    pub supported_tokens: Vec<String>,
    pub max_concurrent_jobs: usize,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            min_amount: 0.000_001,
            max_amount: 1_000_000.0,
            supported_tokens: vec!["USDT".to_string(), "USDC".to_string()],
            max_concurrent_jobs: 16,
        }
    }
}

/// Anchoring/Block Service/Consensus configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub required_confirmations: u32,
    pub finality_depth: u64,
    pub orphan_depth: u64,
    /// `(validator id, stake)` pairs seeded at genesis. The node's own
    /// signing identity must be one of these to ever vote.
    pub initial_validators: Vec<(PublicKey, u128)>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { required_confirmations: 12, finality_depth: 6, orphan_depth: 6, initial_validators: Vec::new() }
    }
}

/// Security configuration.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HMAC secret for inter-subsystem authentication. MUST NOT be
    /// default in production.
    pub hmac_secret: [u8; 32],
    pub nonce_cache_expiry_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { hmac_secret: [0u8; 32], nonce_cache_expiry_secs: 120 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let config = NodeConfig::default();
        assert_eq!(config.network.rdp_listen_port, 3389);
        assert_eq!(config.chain.finality_depth, 6);
    }

    #[test]
    fn validate_rejects_default_hmac() {
        let mut config = NodeConfig::default();
        config.chain.initial_validators.push(([1u8; 32], 1));
        assert!(matches!(config.validate_for_production(), Err(ConfigError::DefaultHmacSecret)));
    }

    #[test]
    fn validate_rejects_an_empty_validator_set() {
        let mut config = NodeConfig::default();
        config.security.hmac_secret = [1u8; 32];
        assert!(matches!(config.validate_for_production(), Err(ConfigError::NoValidators)));
    }

    #[test]
    fn validate_accepts_a_complete_config() {
        let mut config = NodeConfig::default();
        config.security.hmac_secret = [1u8; 32];
        config.chain.initial_validators.push(([1u8; 32], 1));
        assert!(config.validate_for_production().is_ok());
    }
}
