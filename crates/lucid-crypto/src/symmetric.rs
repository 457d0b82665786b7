//! # Symmetric Encryption
//!
//! AEAD encryption for session chunk ciphertext. Three ciphers are
//! supported as a closed enum; there is no non-AEAD fallback path.
//!
//! ## Security Properties
//!
//! - **XChaCha20-Poly1305** (default): 192-bit nonce, constant-time ARX design.
//! - **ChaCha20-Poly1305**: 96-bit nonce, same construction without the extended nonce.
//! - **AES-256-GCM**: use only on hardware with AES-NI.

use crate::CryptoError;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

/// Secret key (256-bit), shared by all three supported ciphers.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Nonce storage. XChaCha20 needs the full 24 bytes; the two 96-bit
/// ciphers use only the first 12 and ignore the rest.
#[derive(Clone)]
pub struct Nonce([u8; 24]);

impl Nonce {
    pub fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    pub fn generate(cipher: Cipher) -> Self {
        let mut bytes = [0u8; 24];
        let len = match cipher {
            Cipher::XChaCha20Poly1305 => 24,
            Cipher::ChaCha20Poly1305 | Cipher::Aes256Gcm => 12,
        };
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes[..len]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

/// AEAD cipher selection. Closed set: there is deliberately no
/// non-AEAD fallback variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cipher {
    /// XChaCha20-Poly1305 (default, side-channel immune).
    #[default]
    XChaCha20Poly1305,
    /// ChaCha20-Poly1305, 96-bit nonce.
    ChaCha20Poly1305,
    /// AES-256-GCM, use with AES-NI only.
    Aes256Gcm,
}

impl Cipher {
    pub fn name(&self) -> &'static str {
        match self {
            Cipher::XChaCha20Poly1305 => "xchacha20-poly1305",
            Cipher::ChaCha20Poly1305 => "chacha20-poly1305",
            Cipher::Aes256Gcm => "aes-256-gcm",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "xchacha20-poly1305" => Some(Cipher::XChaCha20Poly1305),
            "chacha20-poly1305" => Some(Cipher::ChaCha20Poly1305),
            "aes-256-gcm" => Some(Cipher::Aes256Gcm),
            _ => None,
        }
    }
}

/// Encrypt plaintext under the chosen cipher. Returns (ciphertext, nonce).
pub fn encrypt(
    cipher: Cipher,
    key: &SecretKey,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let nonce = Nonce::generate(cipher);

    let ciphertext = match cipher {
        Cipher::XChaCha20Poly1305 => {
            let c = XChaCha20Poly1305::new(key.as_bytes().into());
            c.encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
        }
        Cipher::ChaCha20Poly1305 => {
            let c = ChaCha20Poly1305::new(key.as_bytes().into());
            c.encrypt(chacha20poly1305::Nonce::from_slice(&nonce.as_bytes()[..12]), plaintext)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
        }
        Cipher::Aes256Gcm => {
            let c = Aes256Gcm::new(key.as_bytes().into());
            c.encrypt(aes_gcm::Nonce::from_slice(&nonce.as_bytes()[..12]), plaintext)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
        }
    };

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext under the chosen cipher.
pub fn decrypt(
    cipher: Cipher,
    key: &SecretKey,
    ciphertext: &[u8],
    nonce: &Nonce,
) -> Result<Vec<u8>, CryptoError> {
    match cipher {
        Cipher::XChaCha20Poly1305 => {
            let c = XChaCha20Poly1305::new(key.as_bytes().into());
            c.decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
                .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
        }
        Cipher::ChaCha20Poly1305 => {
            let c = ChaCha20Poly1305::new(key.as_bytes().into());
            c.decrypt(chacha20poly1305::Nonce::from_slice(&nonce.as_bytes()[..12]), ciphertext)
                .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
        }
        Cipher::Aes256Gcm => {
            let c = Aes256Gcm::new(key.as_bytes().into());
            c.decrypt(aes_gcm::Nonce::from_slice(&nonce.as_bytes()[..12]), ciphertext)
                .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
        }
    }
}
