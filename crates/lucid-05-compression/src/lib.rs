//! Stateless per-chunk compression.
//!
//! A thin facade over `lucid-compute`'s CPU kernels: picks an algorithm
//! from the closed zstd/lz4/brotli/none table, runs it on the worker
//! pool, and returns the compressed bytes alongside a stable algorithm
//! tag for persistence on the chunk record. Holds no cross-chunk state;
//! a given `(algorithm, input)` pair is deterministic.

#![warn(missing_docs)]

mod errors;

pub use errors::CompressionError;

use lucid_compute::{ComputeEngine, CompressionAlgorithm};
use std::sync::Arc;

/// Closed set of supported compression algorithms, mirrored from
/// `lucid_compute::CompressionAlgorithm` with a stable wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Zstandard, level 3 by default.
    Zstd,
    /// LZ4 frame format.
    Lz4,
    /// Brotli, default quality.
    Brotli,
    /// No compression; bytes pass through unchanged.
    None,
}

impl Algorithm {
    /// Stable string tag persisted on the chunk record and carried in
    /// session manifests.
    pub fn tag(&self) -> &'static str {
        match self {
            Algorithm::Zstd => "zstd",
            Algorithm::Lz4 => "lz4",
            Algorithm::Brotli => "brotli",
            Algorithm::None => "none",
        }
    }

    /// Parses a stable tag back into an algorithm. Unknown tags are a
    /// hard error at the boundary rather than a silent default.
    pub fn parse(tag: &str) -> Result<Self, CompressionError> {
        match tag {
            "zstd" => Ok(Algorithm::Zstd),
            "lz4" => Ok(Algorithm::Lz4),
            "brotli" => Ok(Algorithm::Brotli),
            "none" => Ok(Algorithm::None),
            other => Err(CompressionError::UnknownAlgorithm(other.to_string())),
        }
    }

    fn to_compute(self) -> CompressionAlgorithm {
        match self {
            Algorithm::Zstd => CompressionAlgorithm::Zstd,
            Algorithm::Lz4 => CompressionAlgorithm::Lz4,
            Algorithm::Brotli => CompressionAlgorithm::Brotli,
            Algorithm::None => CompressionAlgorithm::None,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Zstd
    }
}

/// Compresses and decompresses chunk payloads under a chosen algorithm.
/// Stateless: every call is independent, so a single instance can be
/// shared across every session's pipeline.
pub struct Compressor {
    engine: Arc<dyn ComputeEngine>,
}

impl Compressor {
    pub fn new(engine: Arc<dyn ComputeEngine>) -> Self {
        Self { engine }
    }

    /// Compresses one chunk's raw bytes under `algorithm`.
    pub async fn compress(
        &self,
        algorithm: Algorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, CompressionError> {
        Ok(self.engine.compress(algorithm.to_compute(), data).await?)
    }

    /// Decompresses bytes previously compressed with
    /// [`Compressor::compress`] under the same algorithm.
    pub async fn decompress(
        &self,
        algorithm: Algorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, CompressionError> {
        Ok(self.engine.decompress(algorithm.to_compute(), data).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_every_algorithm() {
        let engine = lucid_compute::auto_detect().unwrap();
        let compressor = Compressor::new(engine);
        let data = b"lucid session capture bytes".repeat(50);

        for algorithm in [Algorithm::Zstd, Algorithm::Lz4, Algorithm::Brotli, Algorithm::None] {
            let compressed = compressor.compress(algorithm, &data).await.unwrap();
            let decompressed = compressor.decompress(algorithm, &compressed).await.unwrap();
            assert_eq!(decompressed, data);
        }
    }

    #[test]
    fn tag_round_trips() {
        for algorithm in [Algorithm::Zstd, Algorithm::Lz4, Algorithm::Brotli, Algorithm::None] {
            assert_eq!(Algorithm::parse(algorithm.tag()).unwrap(), algorithm);
        }
    }

    #[test]
    fn unknown_tag_is_a_hard_error() {
        assert!(Algorithm::parse("rot13").is_err());
    }
}
