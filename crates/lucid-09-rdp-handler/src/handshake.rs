//! The RDP handshake (spec.md §4.5): version negotiation, a per-session
//! ephemeral key handed to the client, and a signed auth blob that
//! proves control of the owner address before the session is allowed
//! into `RECORDING`.
//!
//! This module owns negotiation and verification only; reading bytes
//! off the actual onion-exposed socket and driving the timeout is
//! `lucid-node`'s job, using [`HANDSHAKE_TIMEOUT`] and
//! [`await_within_timeout`].

use crate::errors::RdpError;
use lucid_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use lucid_types::{PublicKey, Signature, SessionId};
use std::future::Future;
use std::time::Duration;

/// Lowest RDP protocol version this handler accepts.
pub const SUPPORTED_RDP_VERSION: u32 = 10;

/// Handshake must complete within this window or the socket is closed
/// without a session ever being instantiated (spec.md §4.5).
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Sent to the client once its declared version is accepted.
#[derive(Debug, Clone)]
pub struct HandshakeChallenge {
    pub session_id: SessionId,
    pub server_version: u32,
    pub ephemeral_public_key: [u8; 32],
}

/// Returned by the client, proving control of the owner address.
#[derive(Debug, Clone)]
pub struct AuthBlob {
    pub owner_public_key: PublicKey,
    pub signature: Signature,
}

/// Rejects any client-declared version below what this handler speaks.
/// There is no downgrade path.
pub fn negotiate_version(client_version: u32) -> Result<u32, RdpError> {
    if client_version < SUPPORTED_RDP_VERSION {
        return Err(RdpError::UnsupportedVersion(client_version));
    }
    Ok(SUPPORTED_RDP_VERSION)
}

/// Starts a handshake for a freshly-created session: generates the
/// per-session ephemeral keypair and builds the challenge to send the
/// client. The keypair is held by the caller only long enough to
/// discard it after verification; it is not session transport key
/// material (that is `lucid-06-encryption`'s per-session AEAD key).
pub fn begin_handshake(session_id: SessionId) -> (HandshakeChallenge, Ed25519KeyPair) {
    let ephemeral = Ed25519KeyPair::generate();
    let challenge = HandshakeChallenge {
        session_id,
        server_version: SUPPORTED_RDP_VERSION,
        ephemeral_public_key: *ephemeral.public_key().as_bytes(),
    };
    (challenge, ephemeral)
}

/// The exact bytes the client must sign: binds the auth blob to this
/// handshake's session id and ephemeral key so it cannot be replayed
/// against a different session.
fn auth_message(challenge: &HandshakeChallenge) -> Vec<u8> {
    let mut message = challenge.session_id.to_string().into_bytes();
    message.extend_from_slice(&challenge.ephemeral_public_key);
    message
}

/// Signs the challenge on behalf of a client; used by tests and by
/// reference client tooling, never by the handler itself.
pub fn sign_challenge(challenge: &HandshakeChallenge, owner: &Ed25519KeyPair) -> AuthBlob {
    let signature = owner.sign(&auth_message(challenge));
    AuthBlob {
        owner_public_key: *owner.public_key().as_bytes(),
        signature: *signature.as_bytes(),
    }
}

/// Verifies the client's auth blob against the challenge it answers.
/// On success, the owner address is the blob's public key - the
/// caller populates `session.owner_address` from it.
pub fn verify_auth_blob(challenge: &HandshakeChallenge, blob: &AuthBlob) -> Result<(), RdpError> {
    let public_key = Ed25519PublicKey::from_bytes(blob.owner_public_key)
        .map_err(RdpError::SignatureInvalid)?;
    let signature = Ed25519Signature::from_bytes(blob.signature);
    public_key
        .verify(&auth_message(challenge), &signature)
        .map_err(RdpError::SignatureInvalid)
}

/// Runs `fut` under the handshake timeout, mapping an elapsed timer
/// into the typed `HandshakeTimeout` error spec.md's failure policy
/// requires.
pub async fn await_within_timeout<F, T>(fut: F) -> Result<T, RdpError>
where
    F: Future<Output = Result<T, RdpError>>,
{
    tokio::time::timeout(HANDSHAKE_TIMEOUT, fut)
        .await
        .unwrap_or(Err(RdpError::HandshakeTimeout(HANDSHAKE_TIMEOUT.as_secs())))
}
