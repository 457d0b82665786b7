//! Error types for the stateful encryptor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncryptionError {
    /// No AEAD cipher could be constructed at start-up. There is no
    /// non-AEAD fallback; the encryptor refuses to run rather than
    /// degrade silently.
    #[error("encryptor unavailable: {0}")]
    Unavailable(#[source] lucid_crypto::CryptoError),

    #[error("unknown algorithm tag on decrypt: {0}")]
    UnknownAlgorithm(String),

    #[error("no key record {key_id} for session {session_id}")]
    UnknownKeyId { session_id: String, key_id: String },

    #[error(transparent)]
    Crypto(#[from] lucid_crypto::CryptoError),
}
