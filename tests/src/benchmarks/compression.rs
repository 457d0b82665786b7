//! Compression throughput across chunk sizes a capture session
//! actually produces (spec.md §4.3's target chunk size is in the low
//! megabytes).

use lucid_05_compression::{Algorithm, Compressor};
use rand::Rng;
use std::time::Instant;

fn capture_like_bytes(size: usize) -> Vec<u8> {
    // Real frame bytes are far from random, but a small tiling of
    // randomness over a mostly-repeated background approximates the
    // compressibility of a static desktop capture well enough to
    // compare algorithms against each other.
    let mut rng = rand::thread_rng();
    let tile: Vec<u8> = (0..4096).map(|_| rng.gen()).collect();
    tile.iter().copied().cycle().take(size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_algorithm_compresses_a_capture_sized_chunk_under_a_second() {
        let engine = lucid_compute::auto_detect().unwrap();
        let compressor = Compressor::new(engine);
        let data = capture_like_bytes(2 * 1024 * 1024);

        for algorithm in [Algorithm::Zstd, Algorithm::Lz4, Algorithm::Brotli, Algorithm::None] {
            let started = Instant::now();
            let compressed = compressor.compress(algorithm, &data).await.unwrap();
            let elapsed = started.elapsed();
            assert!(
                elapsed.as_secs() < 1,
                "{:?} took {:?} on a {} byte chunk",
                algorithm,
                elapsed,
                data.len()
            );
            assert!(!compressed.is_empty());
        }
    }

    #[tokio::test]
    async fn zstd_and_lz4_shrink_a_highly_repetitive_chunk() {
        let engine = lucid_compute::auto_detect().unwrap();
        let compressor = Compressor::new(engine);
        let data = capture_like_bytes(1024 * 1024);

        for algorithm in [Algorithm::Zstd, Algorithm::Lz4] {
            let compressed = compressor.compress(algorithm, &data).await.unwrap();
            assert!(
                compressed.len() < data.len() / 2,
                "{:?} only shrank {} bytes to {} bytes",
                algorithm,
                data.len(),
                compressed.len()
            );
        }
    }
}
