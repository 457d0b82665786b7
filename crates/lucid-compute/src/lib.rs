//! # Lucid-Compute: CPU Worker Pool for the Chunk Pipeline
//!
//! Compute-bound steps of the chunk pipeline — compression, encryption,
//! leaf hashing, and batch signature verification — must run to
//! completion on their worker thread without suspension, so they are not
//! plain `async fn`s scattered across the tokio reactor. This crate
//! gives them one home: a rayon-backed pool behind a small
//! `ComputeEngine` trait.
//!
//! ## Philosophy: No Vendor Lock-in, No Build Failures
//!
//! There is no proof-of-work in this system — Proof-of-Observation-Time
//! is a voting protocol, not a hash race — so there is no GPU backend
//! here either. CPU/Rayon is the only backend and it always works.
//!
//! ## Pipeline Compute Requirements
//!
//! | Component | Workload Type | Notes |
//! |-----------|---------------|-------|
//! | lucid-05-compression | zstd/lz4/brotli encode | CPU-bound, per-chunk |
//! | lucid-06-encryption | AEAD seal/open | CPU-bound, per-chunk |
//! | lucid-07-merkle | BLAKE3/SHA-256 leaf hash | Embarrassingly parallel |
//! | lucid-15-consensus | batch Ed25519 verify | Embarrassingly parallel |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lucid_compute::auto_detect;
//!
//! let engine = auto_detect()?;
//! println!("Using: {}", engine.backend());
//! ```

pub mod backends;
pub mod domain;
pub mod tasks;

use lucid_crypto::CryptoError;
use std::sync::Arc;
use thiserror::Error;

/// Compute backend capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// CPU with Rayon parallelism
    Cpu,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Cpu => write!(f, "CPU (Rayon)"),
        }
    }
}

/// Compression algorithm tag, mirroring the chunk pipeline's algorithm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    Zstd,
    Lz4,
    Brotli,
    None,
}

/// Compute engine errors
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("No compute backend available")]
    NoBackendAvailable,

    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Compute task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cryptographic operation failed: {0}")]
    Crypto(#[from] CryptoError),
}

/// Device information
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend: Backend,
    pub compute_units: u32,
    pub memory_bytes: u64,
    pub supports_f64: bool,
}

/// Compute engine trait, implemented by the CPU worker pool.
#[async_trait::async_trait]
pub trait ComputeEngine: Send + Sync {
    /// Get backend type
    fn backend(&self) -> Backend;

    /// Get device info
    fn device_info(&self) -> &DeviceInfo;

    /// Compress a chunk's plaintext under the given algorithm.
    async fn compress(
        &self,
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, ComputeError>;

    /// Decompress a chunk previously compressed with [`ComputeEngine::compress`].
    async fn decompress(
        &self,
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, ComputeError>;

    /// Encrypt a chunk under the given AEAD cipher and key.
    async fn encrypt(
        &self,
        cipher: lucid_crypto::Cipher,
        key: &lucid_crypto::SecretKey,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, lucid_crypto::Nonce), ComputeError>;

    /// Decrypt a chunk previously sealed with [`ComputeEngine::encrypt`].
    async fn decrypt(
        &self,
        cipher: lucid_crypto::Cipher,
        key: &lucid_crypto::SecretKey,
        ciphertext: &[u8],
        nonce: &lucid_crypto::Nonce,
    ) -> Result<Vec<u8>, ComputeError>;

    /// Batch leaf-hash raw byte buffers (Merkle tree leaves).
    async fn hash_leaf(
        &self,
        algorithm: lucid_crypto::HashAlgorithmTag,
        inputs: &[Vec<u8>],
    ) -> Result<Vec<[u8; 32]>, ComputeError>;

    /// Batch Ed25519 signature verification (consensus votes).
    async fn batch_verify_ed25519(
        &self,
        messages: &[Vec<u8>],
        signatures: &[[u8; 64]],
        public_keys: &[[u8; 32]],
    ) -> Result<Vec<bool>, ComputeError>;
}

/// Auto-detect and create the best available compute engine. CPU is the
/// only backend, so this always succeeds when the `cpu` feature is on.
pub fn auto_detect() -> Result<Arc<dyn ComputeEngine>, ComputeError> {
    #[cfg(feature = "cpu")]
    {
        let engine = backends::cpu::CpuEngine::new();
        tracing::info!(
            "using CPU compute: {} cores (Rayon)",
            engine.device_info().compute_units
        );
        Ok(Arc::new(engine))
    }

    #[cfg(not(feature = "cpu"))]
    {
        Err(ComputeError::NoBackendAvailable)
    }
}

/// Create a specific backend.
pub fn create_backend(backend: Backend) -> Result<Arc<dyn ComputeEngine>, ComputeError> {
    match backend {
        Backend::Cpu => {
            #[cfg(feature = "cpu")]
            {
                Ok(Arc::new(backends::cpu::CpuEngine::new()))
            }
            #[cfg(not(feature = "cpu"))]
            {
                Err(ComputeError::NoBackendAvailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_detect_returns_cpu_backend() {
        let engine = auto_detect().unwrap();
        assert_eq!(engine.backend(), Backend::Cpu);
    }
}
