//! Error types for the compression facade.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("unknown compression algorithm tag: {0}")]
    UnknownAlgorithm(String),

    #[error(transparent)]
    Compute(#[from] lucid_compute::ComputeError),
}
