//! Ties framing, policy consultation, and redaction together into the
//! per-PDU pipeline described in spec.md §4.5 points 1-4, then hands
//! the result to whatever sink the caller wired in (the Pipeline
//! Coordinator, in `lucid-node`).

use crate::errors::RdpError;
use crate::framing::{parse_frame, PduType};
use crate::policy_gate::is_allowed;
use crate::privacy_shield;
use lucid_types::Policy;

/// What happens to one PDU after it clears (or fails) the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// Forwarded to the capture sink under `payload_kind`.
    Forward { payload_kind: &'static str, bytes: Vec<u8> },
    /// Denied by policy; the caller should record a typed audit
    /// violation and continue (not session-fatal).
    Denied { pdu_type: PduType },
}

/// Processes one length-prefixed frame from the front of `buf`:
/// parses the header, enforces the size ceiling, consults policy, and
/// applies privacy-shield redaction to bitmap updates. Returns the
/// outcome and the number of bytes consumed so the caller can advance
/// its read buffer.
pub fn process_frame(buf: &[u8], policy: &Policy) -> Result<(Outcome, usize), RdpError> {
    let (frame, consumed) = parse_frame(buf)?;

    if !is_allowed(policy, frame.pdu_type) {
        return Ok((Outcome::Denied { pdu_type: frame.pdu_type }, consumed));
    }

    let mut bytes = frame.body.to_vec();
    if frame.pdu_type == PduType::BitmapUpdate {
        privacy_shield::redact(&mut bytes, &policy.privacy_shield.zones);
    }

    Ok((
        Outcome::Forward {
            payload_kind: frame.pdu_type.payload_kind(),
            bytes,
        },
        consumed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_types::{CapabilityWhitelist, FileTransferCapability, PrivacyShieldConfig, RedactionZone};

    fn allow_all_policy() -> Policy {
        Policy {
            default_deny: false,
            capabilities: CapabilityWhitelist {
                input: true,
                clipboard: true,
                file_transfer: FileTransferCapability {
                    allowed: true,
                    path_prefixes: Vec::new(),
                },
                application_allow_list: Vec::new(),
            },
            privacy_shield: PrivacyShieldConfig {
                zones: vec![RedactionZone { x: 0, y: 0, width: 4, height: 1 }],
            },
            policy_hash: [0u8; 32],
            owner_signature: [0u8; 64],
            version: 1,
            created_by: [0u8; 32],
            free_session: false,
        }
    }

    fn frame_bytes(pdu_type: u8, body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.push(pdu_type);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn bitmap_updates_are_redacted_before_forwarding() {
        let bytes = frame_bytes(0x04, &[0xFFu8; 8]);
        let (outcome, _) = process_frame(&bytes, &allow_all_policy()).unwrap();
        match outcome {
            Outcome::Forward { payload_kind, bytes } => {
                assert_eq!(payload_kind, "video_frame");
                assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
                assert_eq!(&bytes[4..], &[0xFF; 4]);
            }
            Outcome::Denied { .. } => panic!("expected forward"),
        }
    }

    #[test]
    fn denied_pdu_types_do_not_forward_bytes() {
        let mut policy = allow_all_policy();
        policy.capabilities.clipboard = false;
        let bytes = frame_bytes(0x02, b"clipboard payload");
        let (outcome, _) = process_frame(&bytes, &policy).unwrap();
        assert!(matches!(outcome, Outcome::Denied { pdu_type: PduType::Clipboard }));
    }

    #[test]
    fn oversized_frame_is_rejected_before_policy_consult() {
        let mut header = ((crate::framing::MAX_PACKET_SIZE + 1) as u32).to_be_bytes().to_vec();
        header.push(0x01);
        let err = process_frame(&header, &allow_all_policy()).unwrap_err();
        assert!(matches!(err, RdpError::PacketTooLarge { .. }));
    }
}
