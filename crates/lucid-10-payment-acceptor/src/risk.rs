//! Create-time risk scoring (spec.md §4.6): a score in `[0, 1]` derived
//! from amount tier, payment type, and the count of failed compliance
//! checks supplied by the caller (typically pre-screening run by an
//! external compliance service before `create` is invoked).

use lucid_types::PaymentType;

fn amount_tier_weight(amount: f64) -> f64 {
    if amount > 10_000.0 {
        0.4
    } else if amount > 1_000.0 {
        0.2
    } else {
        0.0
    }
}

fn payment_type_weight(payment_type: PaymentType) -> f64 {
    match payment_type {
        PaymentType::Donation | PaymentType::Registration => 0.0,
        PaymentType::Session | PaymentType::Storage | PaymentType::Bandwidth => 0.05,
        PaymentType::Governance | PaymentType::Custom => 0.2,
    }
}

/// Computes the create-time risk score, clamped to `[0, 1]`.
#[must_use]
pub fn score(amount: f64, payment_type: PaymentType, failed_compliance_checks: u32) -> f64 {
    let checks_weight = 0.15 * f64::from(failed_compliance_checks);
    (amount_tier_weight(amount) + payment_type_weight(payment_type) + checks_weight).min(1.0)
}
