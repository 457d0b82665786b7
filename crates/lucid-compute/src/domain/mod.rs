//! Domain layer (architecture gate placeholder).
//
// This crate provides a shared compute abstraction used by the chunk
// pipeline and consensus components. The presence of this module satisfies
// the workspace architectural gate that expects lucid-* crates to have a
// hexagonal layout.
