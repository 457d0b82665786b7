//! # Bus Message Security
//!
//! The single implementation of envelope validation shared by every
//! component that publishes or consumes `lucid-bus` messages: HMAC
//! signing, timestamp-window checks, and nonce-based replay prevention.
//! Topic authorization itself (who may publish what) lives in
//! `lucid-bus`'s subscription registry, not here.

use crate::envelope::{AuthenticatedMessage, VerificationResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const MAX_FUTURE_SKEW: u64 = 10;
pub const MAX_AGE: u64 = 60;
pub const NONCE_CACHE_TTL: Duration = Duration::from_secs(120);
pub const MAX_NONCE_CACHE_SIZE: usize = 100_000;

/// Thread-safe nonce cache for replay prevention.
#[derive(Debug)]
pub struct NonceCache {
    cache: RwLock<HashMap<Uuid, Instant>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns `true` if the nonce is fresh, `false` if it is a replay.
    pub fn check_and_insert(&self, nonce: Uuid) -> bool {
        let now = Instant::now();
        let expiry = now + NONCE_CACHE_TTL;

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if cache.len() >= MAX_NONCE_CACHE_SIZE {
            cache.retain(|_, exp| *exp > now);
        }

        if let Some(&exp) = cache.get(&nonce) {
            if exp > now {
                return false;
            }
        }

        cache.insert(nonce, expiry);
        true
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates the HMAC-SHA256 signature of an authenticated message.
/// Uses constant-time comparison to prevent timing attacks.
pub fn validate_hmac_signature(
    message_bytes: &[u8],
    signature: &[u8; 64],
    shared_secret: &[u8],
) -> bool {
    let hmac_bytes = &signature[..32];

    let mut mac = match HmacSha256::new_from_slice(shared_secret) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(message_bytes);
    mac.verify_slice(hmac_bytes).is_ok()
}

/// Signs a message with HMAC-SHA256. Returns a 64-byte signature (HMAC
/// in the first 32 bytes, zeros in the remaining 32).
pub fn sign_message(message_bytes: &[u8], shared_secret: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha256::new_from_slice(shared_secret).expect("HMAC can take key of any size");
    mac.update(message_bytes);
    let result = mac.finalize();
    let hmac_bytes = result.into_bytes();

    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(&hmac_bytes);
    signature
}

/// Validates that a message timestamp is within `now - 60s ..= now + 10s`.
pub fn validate_timestamp(timestamp: u64) -> Result<(), VerificationResult> {
    let now = current_timestamp();

    if timestamp + MAX_AGE < now {
        return Err(VerificationResult::TimestampOutOfRange { timestamp, now });
    }

    if timestamp > now + MAX_FUTURE_SKEW {
        return Err(VerificationResult::TimestampOutOfRange { timestamp, now });
    }

    Ok(())
}

/// Returns the current Unix timestamp. Never panics: a clock before the
/// epoch returns 0.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Trait for retrieving shared secrets used to sign/verify bus messages.
pub trait KeyProvider: Send + Sync {
    /// Returns the shared secret for the given component, or `None` if
    /// the component is unknown.
    fn get_shared_secret(&self, component: &str) -> Option<Vec<u8>>;
}

/// Performs every envelope security check in order: version, timestamp,
/// nonce, signature, and reply-to consistency.
pub struct MessageVerifier<K: KeyProvider> {
    nonce_cache: Arc<NonceCache>,
    key_provider: K,
}

impl<K: KeyProvider> MessageVerifier<K> {
    pub fn new(nonce_cache: Arc<NonceCache>, key_provider: K) -> Self {
        Self {
            nonce_cache,
            key_provider,
        }
    }

    pub fn verify<T>(
        &self,
        message: &AuthenticatedMessage<T>,
        message_bytes: &[u8],
    ) -> VerificationResult {
        if message.version != AuthenticatedMessage::<T>::CURRENT_VERSION {
            return VerificationResult::UnsupportedVersion {
                received: message.version,
                supported: AuthenticatedMessage::<T>::CURRENT_VERSION,
            };
        }

        if let Err(e) = validate_timestamp(message.timestamp) {
            return e;
        }

        if !self.nonce_cache.check_and_insert(message.nonce) {
            return VerificationResult::ReplayDetected {
                nonce: message.nonce,
            };
        }

        let shared_secret = match self.key_provider.get_shared_secret(&message.sender) {
            Some(s) => s,
            None => return VerificationResult::InvalidSignature,
        };

        if !validate_hmac_signature(message_bytes, &message.signature, &shared_secret) {
            return VerificationResult::InvalidSignature;
        }

        if let Some(ref reply_to) = message.reply_to {
            if reply_to.component != message.sender {
                return VerificationResult::ReplyToMismatch {
                    reply_to_component: reply_to.component.clone(),
                    sender: message.sender.clone(),
                };
            }
        }

        VerificationResult::Valid
    }
}

/// Derives per-component HMAC keys from a single master secret.
#[derive(Clone)]
pub struct DerivedKeyProvider {
    master_secret: Vec<u8>,
}

impl DerivedKeyProvider {
    pub fn new(master_secret: Vec<u8>) -> Self {
        Self { master_secret }
    }

    fn derive_key(&self, component: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.master_secret).expect("HMAC can take key of any size");
        mac.update(component.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl KeyProvider for DerivedKeyProvider {
    fn get_shared_secret(&self, component: &str) -> Option<Vec<u8>> {
        Some(self.derive_key(component))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_cache_detects_replay() {
        let cache = NonceCache::new();
        let nonce = Uuid::new_v4();
        assert!(cache.check_and_insert(nonce));
        assert!(!cache.check_and_insert(nonce));
    }

    #[test]
    fn nonce_cache_accepts_distinct_nonces() {
        let cache = NonceCache::new();
        assert!(cache.check_and_insert(Uuid::new_v4()));
        assert!(cache.check_and_insert(Uuid::new_v4()));
    }

    #[test]
    fn hmac_round_trips() {
        let secret = b"test_secret_key";
        let message = b"hello world";
        let signature = sign_message(message, secret);
        assert!(validate_hmac_signature(message, &signature, secret));
    }

    #[test]
    fn hmac_rejects_wrong_key() {
        let message = b"hello world";
        let signature = sign_message(message, b"secret_a");
        assert!(!validate_hmac_signature(message, &signature, b"secret_b"));
    }

    #[test]
    fn hmac_rejects_tampered_message() {
        let secret = b"test_secret_key";
        let signature = sign_message(b"hello world", secret);
        assert!(!validate_hmac_signature(b"hello World", &signature, secret));
    }

    #[test]
    fn timestamp_within_window_is_valid() {
        assert!(validate_timestamp(current_timestamp()).is_ok());
    }

    #[test]
    fn timestamp_too_old_is_rejected() {
        let old = current_timestamp() - MAX_AGE - 10;
        assert!(matches!(
            validate_timestamp(old),
            Err(VerificationResult::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn timestamp_too_far_future_is_rejected() {
        let future = current_timestamp() + MAX_FUTURE_SKEW + 10;
        assert!(matches!(
            validate_timestamp(future),
            Err(VerificationResult::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn derived_keys_differ_per_component() {
        let provider = DerivedKeyProvider::new(b"master_secret".to_vec());
        let key_a = provider.get_shared_secret("lucid-03-capture").unwrap();
        let key_b = provider.get_shared_secret("lucid-10-payment-acceptor").unwrap();
        assert_ne!(key_a, key_b);
        assert_eq!(key_a, provider.get_shared_secret("lucid-03-capture").unwrap());
    }
}
