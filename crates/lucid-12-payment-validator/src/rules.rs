//! The five rule groups, each a pure function over a request snapshot
//! and shared config/context, contributing to a running
//! [`ValidationAccumulator`].

use crate::types::{is_kyc_sensitive, ValidationAccumulator, ValidationContext, ValidatorConfig};
use lucid_types::PaymentRequest;

fn is_well_formed_address(address: &str) -> bool {
    address.len() >= 10 && address.len() <= 128 && address.chars().all(|c| c.is_ascii_graphic())
}

/// Amount range, address well-formedness, and blocklist hits.
pub fn basic(config: &ValidatorConfig, request: &PaymentRequest, acc: &mut ValidationAccumulator) {
    if request.amount < config.min_amount {
        acc.errors.push("amount below minimum".to_string());
        acc.add_score(0.3);
    }
    if request.amount > config.large_amount_threshold {
        acc.warnings.push("large amount transaction".to_string());
        acc.add_score(0.2);
    }

    if let Some(sender) = &request.sender_address {
        if !is_well_formed_address(sender) {
            acc.errors.push("invalid sender address format".to_string());
            acc.add_score(0.5);
        }
        if config.blocked_addresses.contains(sender) {
            acc.errors.push("sender address is blocked".to_string());
            acc.flags.push("blocked_sender".to_string());
            acc.add_score(1.0);
            acc.blocklist_hit = true;
        }
    }

    if !is_well_formed_address(&request.recipient_address) {
        acc.errors.push("invalid recipient address format".to_string());
        acc.add_score(0.5);
    }
    if config.blocked_addresses.contains(&request.recipient_address) {
        acc.errors.push("recipient address is blocked".to_string());
        acc.flags.push("blocked_recipient".to_string());
        acc.add_score(1.0);
        acc.blocklist_hit = true;
    }
}

/// Rolling daily/hourly volume limits.
pub fn enhanced(
    config: &ValidatorConfig,
    request: &PaymentRequest,
    context: &ValidationContext,
    acc: &mut ValidationAccumulator,
) {
    if context.daily_amount_so_far + request.amount > config.max_daily_amount {
        acc.warnings.push("daily volume limit exceeded".to_string());
        acc.flags.push("daily_limit_exceeded".to_string());
        acc.add_score(0.1);
    }
    if context.hourly_amount_so_far + request.amount > config.max_hourly_amount {
        acc.warnings.push("hourly volume limit exceeded".to_string());
        acc.flags.push("hourly_limit_exceeded".to_string());
        acc.add_score(0.1);
    }
}

/// Regulatory reporting thresholds.
pub fn compliance(config: &ValidatorConfig, request: &PaymentRequest, acc: &mut ValidationAccumulator) {
    if request.amount > config.large_amount_threshold {
        acc.warnings.push("transaction exceeds regulatory reporting threshold".to_string());
        acc.flags.push("regulatory_reporting".to_string());
        acc.add_score(0.1);
    }
}

/// Sanctions, PEP, and adverse-media screening.
pub fn aml(config: &ValidatorConfig, request: &PaymentRequest, acc: &mut ValidationAccumulator) {
    let addresses: Vec<&str> = [request.sender_address.as_deref(), Some(request.recipient_address.as_str())]
        .into_iter()
        .flatten()
        .collect();

    for address in &addresses {
        if config.sanctioned_addresses.contains(*address) {
            acc.errors.push("address found on sanctions list".to_string());
            acc.flags.push("sanctions_hit".to_string());
            acc.add_score(1.0);
            acc.blocklist_hit = true;
        }
        if config.pep_addresses.contains(*address) {
            acc.warnings.push("address associated with a politically exposed person".to_string());
            acc.flags.push("pep_associated".to_string());
            acc.add_score(0.3);
        }
        if config.adverse_media_addresses.contains(*address) {
            acc.warnings.push("address found in adverse media".to_string());
            acc.flags.push("adverse_media".to_string());
            acc.add_score(0.2);
        }
    }
}

/// KYC requirement for large or KYC-sensitive payment types.
pub fn kyc(
    config: &ValidatorConfig,
    request: &PaymentRequest,
    context: &ValidationContext,
    acc: &mut ValidationAccumulator,
) {
    let requires_kyc = request.amount > config.kyc_required_above || is_kyc_sensitive(request.payment_type);
    if !requires_kyc {
        return;
    }
    if !context.kyc_verified {
        acc.errors.push("KYC verification required for this payment".to_string());
        acc.flags.push("kyc_required".to_string());
        acc.add_score(0.5);
    } else if context.kyc_expired {
        acc.warnings.push("KYC verification has expired".to_string());
        acc.flags.push("kyc_expired".to_string());
        acc.add_score(0.3);
    }
}
