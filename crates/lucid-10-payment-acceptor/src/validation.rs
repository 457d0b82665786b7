//! Create-time validation (spec.md §4.6 point 1): amount range, token
//! set, address well-formedness, required linkage, blocklist. `create`
//! collects every failure rather than stopping at the first.

use crate::errors::RejectionReason;
use lucid_types::{PaymentLinkage, PaymentType};
use std::collections::HashSet;

/// Tunable acceptance bounds and the supported token/blocklist sets.
pub struct ValidationRules {
    pub min_amount: f64,
    pub max_amount: f64,
    pub supported_tokens: HashSet<String>,
    pub blocklisted_addresses: HashSet<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_amount: 0.000_001,
            max_amount: 1_000_000.0,
            supported_tokens: ["USDT", "TRX"].iter().map(|s| s.to_string()).collect(),
            blocklisted_addresses: HashSet::new(),
        }
    }
}

fn is_well_formed_address(address: &str) -> bool {
    (10..=128).contains(&address.len()) && address.chars().all(|c| c.is_ascii_graphic())
}

fn requires_session_linkage(payment_type: PaymentType) -> bool {
    matches!(payment_type, PaymentType::Session | PaymentType::Storage | PaymentType::Bandwidth)
}

/// Validates one draft request against `rules`. Returns every reason
/// it fails; an empty vec means the request may be accepted.
pub fn validate(
    rules: &ValidationRules,
    amount: f64,
    token_type: &str,
    payment_type: PaymentType,
    recipient_address: &str,
    sender_address: Option<&str>,
    linkage: &PaymentLinkage,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    if amount < rules.min_amount || amount > rules.max_amount {
        reasons.push(RejectionReason::AmountOutOfRange {
            amount,
            min: rules.min_amount,
            max: rules.max_amount,
        });
    }

    if !rules.supported_tokens.contains(token_type) {
        reasons.push(RejectionReason::UnsupportedToken(token_type.to_string()));
    }

    if !is_well_formed_address(recipient_address) {
        reasons.push(RejectionReason::MalformedRecipient);
    }

    if let Some(sender) = sender_address {
        if !is_well_formed_address(sender) {
            reasons.push(RejectionReason::MalformedSender);
        }
    }

    if requires_session_linkage(payment_type) && matches!(linkage, PaymentLinkage::None) {
        reasons.push(RejectionReason::MissingRequiredLinkage(payment_type));
    }

    if rules.blocklisted_addresses.contains(recipient_address) {
        reasons.push(RejectionReason::Blocklisted(recipient_address.to_string()));
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> String {
        format!("T{}", "x".repeat(33 + n as usize))
    }

    #[test]
    fn a_well_formed_request_passes() {
        let rules = ValidationRules::default();
        let reasons = validate(
            &rules,
            10.0,
            "USDT",
            PaymentType::Session,
            &addr(0),
            None,
            &PaymentLinkage::Session(lucid_types::SessionId::new()),
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn collects_every_failure_reason() {
        let rules = ValidationRules::default();
        let reasons = validate(
            &rules,
            -5.0,
            "DOGE",
            PaymentType::Session,
            "bad",
            None,
            &PaymentLinkage::None,
        );
        assert_eq!(reasons.len(), 4);
    }

    #[test]
    fn blocklisted_recipient_is_rejected() {
        let mut rules = ValidationRules::default();
        let recipient = addr(1);
        rules.blocklisted_addresses.insert(recipient.clone());
        let reasons = validate(
            &rules,
            10.0,
            "USDT",
            PaymentType::Donation,
            &recipient,
            None,
            &PaymentLinkage::None,
        );
        assert!(reasons.contains(&RejectionReason::Blocklisted(recipient)));
    }
}
