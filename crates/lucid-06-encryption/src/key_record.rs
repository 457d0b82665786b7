//! Per-session key record: `(key_id, key_bytes, algorithm, created_at,
//! expires_at, nonce_counter)`.

use lucid_crypto::{Cipher, SecretKey};
use lucid_types::now_unix;

/// Default key lifetime before scheduled rotation.
pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 60 * 60;

/// One generation of a session's encryption key. Chunks encrypted
/// under a superseded record remain decryptable; only new encryptions
/// move to the newest record.
pub struct KeyRecord {
    pub key_id: String,
    pub key: SecretKey,
    pub algorithm: Cipher,
    pub created_at: u64,
    pub expires_at: u64,
    nonce_counter: u64,
}

impl KeyRecord {
    pub fn generate(algorithm: Cipher, rotation_interval_secs: u64) -> Self {
        let created_at = now_unix();
        Self {
            key_id: uuid::Uuid::new_v4().to_string(),
            key: SecretKey::generate(),
            algorithm,
            created_at,
            expires_at: created_at + rotation_interval_secs,
            nonce_counter: 0,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Advances and returns this session's replay-detection counter.
    /// Strictly monotonic; carried in the packet header.
    pub fn next_nonce_counter(&mut self) -> u64 {
        self.nonce_counter += 1;
        self.nonce_counter
    }
}
