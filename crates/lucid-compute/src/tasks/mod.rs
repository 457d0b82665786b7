//! Compute-bound pipeline tasks built on top of [`crate::ComputeEngine`].

pub mod merkle;
pub mod signatures;
