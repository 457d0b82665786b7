//! The height-0 block and the validator roster it is built against.

pub mod builder;

pub use builder::{devnet, Genesis, GenesisBuilder, GenesisConfig, GenesisError};
