//! # RDP Protocol Handler
//!
//! Terminates RDP transport on an onion-exposed listener (spec.md
//! §4.5). Parses only the framing header - a 4-byte length prefix plus
//! a 1-byte PDU type tag - and treats the payload opaquely: policy is
//! consulted per PDU type, bitmap updates are redacted under the
//! privacy shield, and the result is forwarded to the Session Pipeline
//! Coordinator. The handshake authenticates the owner address and
//! transitions the session into `RECORDING`.

#![warn(missing_docs)]
#![allow(missing_docs)]

mod dispatcher;
mod errors;
mod framing;
mod handshake;
mod policy_gate;
mod privacy_shield;

pub use dispatcher::{process_frame, Outcome};
pub use errors::RdpError;
pub use framing::{parse_frame, Frame, PduType, HEADER_LEN, MAX_PACKET_SIZE};
pub use handshake::{
    await_within_timeout, begin_handshake, negotiate_version, sign_challenge, verify_auth_blob,
    AuthBlob, HandshakeChallenge, HANDSHAKE_TIMEOUT, SUPPORTED_RDP_VERSION,
};
pub use policy_gate::is_allowed;
