//! CPU compute backend using Rayon
//!
//! This is the only backend. It uses Rayon for parallel execution across
//! CPU cores for the pipeline's embarrassingly-parallel steps (leaf
//! hashing, batch signature verification) and does single-threaded work
//! inline for the rest (compression, encryption are already bounded by
//! one chunk's worth of data).

use crate::{Backend, ComputeEngine, ComputeError, CompressionAlgorithm, DeviceInfo};
use lucid_crypto::{Cipher, Ed25519PublicKey, Ed25519Signature, HashAlgorithmTag, Nonce, SecretKey};
use rayon::prelude::*;

/// CPU-based compute engine using Rayon
pub struct CpuEngine {
    device_info: DeviceInfo,
}

impl CpuEngine {
    pub fn new() -> Self {
        let num_cpus = num_cpus::get() as u32;

        Self {
            device_info: DeviceInfo {
                name: format!("CPU ({} cores)", num_cpus),
                backend: Backend::Cpu,
                compute_units: num_cpus,
                memory_bytes: 0,
                supports_f64: true,
            },
        }
    }

    fn compress_one(algorithm: CompressionAlgorithm, data: &[u8]) -> Result<Vec<u8>, ComputeError> {
        match algorithm {
            CompressionAlgorithm::None => Ok(data.to_vec()),
            CompressionAlgorithm::Zstd => zstd::encode_all(data, 0)
                .map_err(|e| ComputeError::TaskFailed(format!("zstd encode: {e}"))),
            CompressionAlgorithm::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            CompressionAlgorithm::Brotli => {
                let mut out = Vec::new();
                let params = brotli::enc::BrotliEncoderParams::default();
                brotli::BrotliCompress(&mut std::io::Cursor::new(data), &mut out, &params)
                    .map_err(|e| ComputeError::TaskFailed(format!("brotli encode: {e}")))?;
                Ok(out)
            }
        }
    }

    fn decompress_one(
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, ComputeError> {
        match algorithm {
            CompressionAlgorithm::None => Ok(data.to_vec()),
            CompressionAlgorithm::Zstd => zstd::decode_all(data)
                .map_err(|e| ComputeError::TaskFailed(format!("zstd decode: {e}"))),
            CompressionAlgorithm::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| ComputeError::TaskFailed(format!("lz4 decode: {e}"))),
            CompressionAlgorithm::Brotli => {
                let mut out = Vec::new();
                brotli::BrotliDecompress(&mut std::io::Cursor::new(data), &mut out)
                    .map_err(|e| ComputeError::TaskFailed(format!("brotli decode: {e}")))?;
                Ok(out)
            }
        }
    }
}

impl Default for CpuEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ComputeEngine for CpuEngine {
    fn backend(&self) -> Backend {
        Backend::Cpu
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    async fn compress(
        &self,
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, ComputeError> {
        Self::compress_one(algorithm, data)
    }

    async fn decompress(
        &self,
        algorithm: CompressionAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, ComputeError> {
        Self::decompress_one(algorithm, data)
    }

    async fn encrypt(
        &self,
        cipher: Cipher,
        key: &SecretKey,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Nonce), ComputeError> {
        lucid_crypto::encrypt(cipher, key, plaintext).map_err(ComputeError::from)
    }

    async fn decrypt(
        &self,
        cipher: Cipher,
        key: &SecretKey,
        ciphertext: &[u8],
        nonce: &Nonce,
    ) -> Result<Vec<u8>, ComputeError> {
        lucid_crypto::decrypt(cipher, key, ciphertext, nonce).map_err(ComputeError::from)
    }

    async fn hash_leaf(
        &self,
        algorithm: HashAlgorithmTag,
        inputs: &[Vec<u8>],
    ) -> Result<Vec<[u8; 32]>, ComputeError> {
        let results: Vec<[u8; 32]> = inputs
            .par_iter()
            .map(|input| match algorithm {
                HashAlgorithmTag::Blake3 => lucid_crypto::blake3_hash(input),
                HashAlgorithmTag::Sha256 => lucid_crypto::sha256_hash(input),
            })
            .collect();

        Ok(results)
    }

    async fn batch_verify_ed25519(
        &self,
        messages: &[Vec<u8>],
        signatures: &[[u8; 64]],
        public_keys: &[[u8; 32]],
    ) -> Result<Vec<bool>, ComputeError> {
        if messages.len() != signatures.len() || messages.len() != public_keys.len() {
            return Err(ComputeError::InvalidInput(
                "mismatched input array lengths".to_string(),
            ));
        }

        let results: Vec<bool> = (0..messages.len())
            .into_par_iter()
            .map(|i| {
                let pubkey = match Ed25519PublicKey::from_bytes(public_keys[i]) {
                    Ok(pk) => pk,
                    Err(_) => return false,
                };

                let signature = Ed25519Signature::from_bytes(signatures[i]);

                pubkey.verify(&messages[i], &signature).is_ok()
            })
            .collect();

        Ok(results)
    }
}
