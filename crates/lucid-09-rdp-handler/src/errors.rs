//! Error taxonomy for framing, handshake, and policy dispatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RdpError {
    #[error("declared PDU length {declared} exceeds the {max} byte ceiling")]
    PacketTooLarge { declared: usize, max: usize },

    #[error("frame header truncated: need {need} bytes, got {got}")]
    TruncatedHeader { need: usize, got: usize },

    #[error("unknown PDU type tag {0:#04x}")]
    UnknownPduType(u8),

    #[error("handshake malformed: {0}")]
    MalformedHandshake(String),

    #[error("handshake signature verification failed")]
    SignatureInvalid(#[source] lucid_crypto::CryptoError),

    #[error("handshake timed out after {0}s")]
    HandshakeTimeout(u64),

    #[error("unsupported RDP version {0}")]
    UnsupportedVersion(u32),
}

/// A policy-denied PDU. Not an error the caller need surface loudly -
/// the handler records it as a typed audit violation and moves on -
/// but typed rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDenied {
    pub pdu_type: crate::framing::PduType,
}
