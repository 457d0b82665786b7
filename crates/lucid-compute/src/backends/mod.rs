//! Compute backends.
//!
//! CPU is the only backend. There is no proof-of-work in this system, so
//! there is no GPU kernel to accelerate — the pipeline's compute-bound
//! steps (compression, encryption, hashing, signature verification) are
//! all well served by Rayon's work-stealing thread pool.

#[cfg(feature = "cpu")]
pub mod cpu;
