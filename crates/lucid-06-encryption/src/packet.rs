//! The self-describing on-wire chunk packet (spec §6).
//!
//! JSON-encoded: `session_id`, `key_id`, `algorithm` (stable string
//! tag), `nonce` (base64), `ciphertext` (base64), optional
//! `additional_data` (base64), `timestamp` (ISO 8601 UTC), plus
//! `nonce_counter` for per-session replay detection.

use crate::errors::EncryptionError;
use base64::{engine::general_purpose::STANDARD, Engine};
use lucid_crypto::{Cipher, Nonce};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPacket {
    pub session_id: String,
    pub key_id: String,
    pub algorithm: String,
    pub nonce: String,
    pub ciphertext: String,
    pub additional_data: Option<String>,
    pub timestamp: String,
    pub nonce_counter: u64,
}

impl ChunkPacket {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        key_id: String,
        algorithm: Cipher,
        nonce: &Nonce,
        ciphertext: Vec<u8>,
        additional_data: Option<Vec<u8>>,
        nonce_counter: u64,
    ) -> Self {
        Self {
            session_id,
            key_id,
            algorithm: algorithm.name().to_string(),
            nonce: STANDARD.encode(nonce.as_bytes()),
            ciphertext: STANDARD.encode(ciphertext),
            additional_data: additional_data.map(|aad| STANDARD.encode(aad)),
            timestamp: chrono::Utc::now().to_rfc3339(),
            nonce_counter,
        }
    }

    /// The algorithm tag is stable across versions; any other tag is a
    /// hard error on decrypt.
    pub fn cipher(&self) -> Result<Cipher, EncryptionError> {
        Cipher::parse(&self.algorithm)
            .ok_or_else(|| EncryptionError::UnknownAlgorithm(self.algorithm.clone()))
    }

    pub fn nonce(&self) -> Result<Nonce, EncryptionError> {
        let bytes = STANDARD
            .decode(&self.nonce)
            .map_err(|e| EncryptionError::UnknownAlgorithm(format!("bad nonce encoding: {e}")))?;
        let mut fixed = [0u8; 24];
        let n = bytes.len().min(24);
        fixed[..n].copy_from_slice(&bytes[..n]);
        Ok(Nonce::from_bytes(fixed))
    }

    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, EncryptionError> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| EncryptionError::UnknownAlgorithm(format!("bad ciphertext encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let nonce = Nonce::from_bytes([7u8; 24]);
        let packet = ChunkPacket::new(
            "session-1".into(),
            "key-1".into(),
            Cipher::XChaCha20Poly1305,
            &nonce,
            vec![1, 2, 3],
            None,
            1,
        );

        let json = serde_json::to_string(&packet).unwrap();
        let parsed: ChunkPacket = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.session_id, "session-1");
        assert_eq!(parsed.cipher().unwrap(), Cipher::XChaCha20Poly1305);
        assert_eq!(parsed.ciphertext_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn unknown_algorithm_tag_is_a_hard_error() {
        let mut packet = ChunkPacket::new(
            "session-1".into(),
            "key-1".into(),
            Cipher::XChaCha20Poly1305,
            &Nonce::from_bytes([0u8; 24]),
            vec![],
            None,
            1,
        );
        packet.algorithm = "rot13".into();

        assert!(packet.cipher().is_err());
    }
}
