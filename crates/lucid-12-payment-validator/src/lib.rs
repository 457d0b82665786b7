//! # Payment Validator
//!
//! Synchronous, decision-oriented compliance/risk check applied before
//! a payment request becomes VALIDATED (spec.md §4.8). Pure: the same
//! request snapshot, config, and context always produce the same
//! decision, and nothing here mutates the request. Acting on the
//! decision is left to whoever calls it.

#![warn(missing_docs)]
#![allow(missing_docs)]

mod rules;
mod types;

pub use types::{
    is_kyc_sensitive, ComplianceStatus, RiskLevel, ValidationAccumulator, ValidationContext,
    ValidationOutcome, ValidationStatus, ValidationType, ValidatorConfig,
};

/// Runs the full basic -> enhanced -> compliance -> AML -> KYC
/// pipeline and reduces the accumulated findings to a single decision.
#[must_use]
pub fn validate(
    config: &ValidatorConfig,
    request: &lucid_types::PaymentRequest,
    context: &ValidationContext,
) -> ValidationOutcome {
    let mut acc = ValidationAccumulator::default();
    rules::basic(config, request, &mut acc);
    rules::enhanced(config, request, context, &mut acc);
    rules::compliance(config, request, &mut acc);
    rules::aml(config, request, &mut acc);
    rules::kyc(config, request, context, &mut acc);

    let raw_score = acc.score;
    let status = if raw_score >= 1.0 || acc.blocklist_hit {
        ValidationStatus::Blocked
    } else if raw_score >= 0.7 {
        ValidationStatus::Suspicious
    } else if raw_score >= 0.4 {
        ValidationStatus::ManualReview
    } else if !acc.errors.is_empty() {
        ValidationStatus::Invalid
    } else {
        ValidationStatus::Valid
    };

    let risk_level = if raw_score >= 1.0 {
        RiskLevel::Critical
    } else if raw_score >= 0.7 {
        RiskLevel::High
    } else if raw_score >= 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let compliance_status = match status {
        ValidationStatus::Blocked => ComplianceStatus::NonCompliant,
        ValidationStatus::Suspicious | ValidationStatus::ManualReview => ComplianceStatus::PendingReview,
        ValidationStatus::Valid | ValidationStatus::Invalid => ComplianceStatus::Compliant,
    };

    ValidationOutcome {
        status,
        risk_level,
        compliance_status,
        score: raw_score.min(1.0),
        errors: acc.errors,
        warnings: acc.warnings,
        flags: acc.flags,
    }
}
