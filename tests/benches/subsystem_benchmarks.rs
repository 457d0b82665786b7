//! # Lucid Data-Path Benchmarks
//!
//! Performance validation for the per-chunk hot path every recorded
//! session runs through (spec.md §4.3-§4.5, §4.9):
//!
//! | Component | Claim | Target |
//! |-----------|-------|--------|
//! | lucid-05 Compression | zstd on a capture-sized chunk | sub-second |
//! | lucid-06 Encryption | AEAD seal of a compressed chunk | sub-millisecond |
//! | lucid-07 Merkle | leaf append + finalize over a session | sub-second at 10k leaves |
//! | lucid-crypto | Ed25519 handshake signature verify | sub-millisecond |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lucid_05_compression::{Algorithm, Compressor};
use lucid_06_encryption::Encryptor;
use lucid_07_merkle::MerkleBuilder;
use lucid_crypto::{Cipher, Ed25519KeyPair};
use lucid_types::HashAlgorithm;
use rand::Rng;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().expect("tokio runtime for benchmark harness")
}

fn capture_like_bytes(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let tile: Vec<u8> = (0..4096).map(|_| rng.gen()).collect();
    tile.iter().copied().cycle().take(size).collect()
}

fn bench_compression(c: &mut Criterion) {
    let rt = runtime();
    let engine = lucid_compute::auto_detect().expect("cpu compute backend available");
    let compressor = Compressor::new(engine);

    let mut group = c.benchmark_group("lucid-05-compression");
    group.measurement_time(Duration::from_secs(10));

    for size in [64 * 1024, 512 * 1024, 2 * 1024 * 1024] {
        let data = capture_like_bytes(size);
        group.throughput(Throughput::Bytes(size as u64));
        for algorithm in [Algorithm::Zstd, Algorithm::Lz4, Algorithm::None] {
            group.bench_with_input(BenchmarkId::new(algorithm.tag(), size), &data, |b, data| {
                b.iter(|| rt.block_on(async { black_box(compressor.compress(algorithm, data).await.unwrap()) }));
            });
        }
    }
    group.finish();
}

fn bench_encryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("lucid-06-encryption");
    group.measurement_time(Duration::from_secs(10));

    for size in [64 * 1024, 1024 * 1024] {
        let chunk = vec![0x42u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("seal", size), &chunk, |b, chunk| {
            let mut encryptor = Encryptor::with_default_rotation(Cipher::XChaCha20Poly1305).unwrap();
            b.iter(|| black_box(encryptor.encrypt("bench-session", chunk, None).unwrap()));
        });
    }
    group.finish();
}

fn bench_merkle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lucid-07-merkle");
    group.measurement_time(Duration::from_secs(10));

    for leaf_count in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(leaf_count));
        group.bench_with_input(BenchmarkId::new("append_and_finalize", leaf_count), &leaf_count, |b, &n| {
            b.iter(|| {
                let mut builder = MerkleBuilder::new(HashAlgorithm::Blake3);
                for i in 0..n {
                    let mut leaf = [0u8; 32];
                    leaf[..8].copy_from_slice(&i.to_le_bytes());
                    builder.append(lucid_crypto::blake3_hash(&leaf));
                }
                black_box(builder.finalize(0).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_handshake_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("lucid-crypto-ed25519");

    let owner = Ed25519KeyPair::generate();
    let message = b"session-id-and-ephemeral-key-bytes";
    let signature = owner.sign(message);
    let public_key = *owner.public_key().as_bytes();

    group.bench_function("sign", |b| {
        b.iter(|| black_box(owner.sign(message)));
    });

    group.bench_function("verify", |b| {
        let verifying_key = lucid_crypto::Ed25519PublicKey::from_bytes(public_key).unwrap();
        b.iter(|| black_box(verifying_key.verify(message, &signature).is_ok()));
    });
    group.finish();
}

criterion_group!(benches, bench_compression, bench_encryption, bench_merkle, bench_handshake_signature);
criterion_main!(benches);
