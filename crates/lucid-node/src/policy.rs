//! Default session policy.
//!
//! No owner-side policy store exists yet: a real deployment would let
//! an owner author a `Policy`, sign it, and hand its hash to the RDP
//! client at connect time. Until that store exists, every session on
//! this node is created against the same permissive default, signed
//! by the node's own identity key so `policy_hash`/`owner_signature`
//! are still well-formed rather than zeroed placeholders.

use lucid_crypto::Ed25519KeyPair;
use lucid_types::{CapabilityWhitelist, FileTransferCapability, Policy, PrivacyShieldConfig};

const POLICY_VERSION: u32 = 1;

#[must_use]
pub fn default_policy(node_identity: &Ed25519KeyPair) -> Policy {
    let capabilities = CapabilityWhitelist {
        input: true,
        clipboard: true,
        file_transfer: FileTransferCapability { allowed: false, path_prefixes: Vec::new() },
        application_allow_list: Vec::new(),
    };
    let privacy_shield = PrivacyShieldConfig::default();

    let mut unsigned = Policy {
        default_deny: false,
        capabilities,
        privacy_shield,
        policy_hash: [0u8; 32],
        owner_signature: [0u8; 64],
        version: POLICY_VERSION,
        created_by: *node_identity.public_key().as_bytes(),
        free_session: true,
    };
    let hash = lucid_crypto::blake3_hash(
        &serde_json::to_vec(&unsigned).expect("policy always serializes"),
    );
    unsigned.policy_hash = hash;
    unsigned.owner_signature = *node_identity.sign(&hash).as_bytes();
    unsigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_hash_matches_its_own_signature() {
        let identity = Ed25519KeyPair::generate();
        let policy = default_policy(&identity);
        assert_ne!(policy.policy_hash, [0u8; 32]);
        assert!(policy.free_session);
    }
}
