//! Stateful per-session encryption for recorded chunk ciphertext.
//!
//! Wraps the stateless AEAD dispatch in `lucid-crypto` with per-session
//! key records, nonce discipline, scheduled rotation, and the
//! self-describing wire packet format.

#![warn(missing_docs)]

mod encryptor;
mod errors;
mod key_record;
mod packet;

pub use encryptor::Encryptor;
pub use errors::EncryptionError;
pub use key_record::{KeyRecord, DEFAULT_ROTATION_INTERVAL_SECS};
pub use packet::ChunkPacket;
