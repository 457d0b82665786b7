//! Per-PDU-type policy consultation (spec.md §4.5 point 2).
//!
//! Bitmap-update and control PDUs carry the session itself and are
//! always forwarded (subject to privacy-shield redaction on bitmap
//! updates); input, clipboard, and file-transfer are gated by the
//! session's capability whitelist.

use crate::framing::PduType;
use lucid_types::Policy;

/// Whether `policy` permits a PDU of `pdu_type` to be forwarded.
#[must_use]
pub fn is_allowed(policy: &Policy, pdu_type: PduType) -> bool {
    match pdu_type {
        PduType::Input => policy.capabilities.input,
        PduType::Clipboard => policy.capabilities.clipboard,
        PduType::FileTransfer => policy.capabilities.file_transfer.allowed,
        PduType::BitmapUpdate | PduType::Control => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_types::{CapabilityWhitelist, FileTransferCapability, PrivacyShieldConfig};

    fn policy(input: bool, clipboard: bool, file_transfer: bool) -> Policy {
        Policy {
            default_deny: true,
            capabilities: CapabilityWhitelist {
                input,
                clipboard,
                file_transfer: FileTransferCapability {
                    allowed: file_transfer,
                    path_prefixes: Vec::new(),
                },
                application_allow_list: Vec::new(),
            },
            privacy_shield: PrivacyShieldConfig::default(),
            policy_hash: [0u8; 32],
            owner_signature: [0u8; 64],
            version: 1,
            created_by: [0u8; 32],
            free_session: false,
        }
    }

    #[test]
    fn gates_input_clipboard_and_file_transfer_independently() {
        let p = policy(true, false, false);
        assert!(is_allowed(&p, PduType::Input));
        assert!(!is_allowed(&p, PduType::Clipboard));
        assert!(!is_allowed(&p, PduType::FileTransfer));
    }

    #[test]
    fn bitmap_and_control_are_never_denied() {
        let p = policy(false, false, false);
        assert!(is_allowed(&p, PduType::BitmapUpdate));
        assert!(is_allowed(&p, PduType::Control));
    }
}
