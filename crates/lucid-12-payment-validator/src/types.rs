//! Decision vocabulary for the validation pipeline (spec.md §4.8).

use lucid_types::PaymentType;
use std::collections::HashSet;

/// Final decision a [`crate::validate`] call reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    ManualReview,
    Suspicious,
    Blocked,
}

/// Coarse risk bucket derived from the accumulated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Regulatory posture derived from which rule groups raised errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    PendingReview,
}

/// The five rule groups evaluated in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationType {
    Basic,
    Enhanced,
    Compliance,
    Aml,
    Kyc,
}

/// Address lists and limits the rule pipeline checks against. Building
/// this is the caller's job; the validator itself never mutates or
/// fetches this data.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    pub blocked_addresses: HashSet<String>,
    pub sanctioned_addresses: HashSet<String>,
    pub pep_addresses: HashSet<String>,
    pub adverse_media_addresses: HashSet<String>,
    pub min_amount: f64,
    pub large_amount_threshold: f64,
    pub kyc_required_above: f64,
    pub max_daily_amount: f64,
    pub max_hourly_amount: f64,
}

impl ValidatorConfig {
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            blocked_addresses: HashSet::new(),
            sanctioned_addresses: HashSet::new(),
            pep_addresses: HashSet::new(),
            adverse_media_addresses: HashSet::new(),
            min_amount: 0.01,
            large_amount_threshold: 10_000.0,
            kyc_required_above: 5_000.0,
            max_daily_amount: 50_000.0,
            max_hourly_amount: 5_000.0,
        }
    }
}

/// Facts about the requester that aren't carried on the payment
/// request itself but still feed compliance decisions.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub kyc_verified: bool,
    pub kyc_expired: bool,
    pub daily_amount_so_far: f64,
    pub hourly_amount_so_far: f64,
    pub now: u64,
}

/// Whether a payment type requires prior KYC once a request is large
/// enough to matter.
#[must_use]
pub fn is_kyc_sensitive(payment_type: PaymentType) -> bool {
    matches!(payment_type, PaymentType::Registration | PaymentType::Governance | PaymentType::Custom)
}

/// Accumulates a rule pipeline's findings before the final decision is
/// taken.
#[derive(Debug, Clone, Default)]
pub struct ValidationAccumulator {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub flags: Vec<String>,
    pub score: f64,
    pub blocklist_hit: bool,
}

impl ValidationAccumulator {
    pub fn add_score(&mut self, amount: f64) {
        self.score += amount;
    }
}

/// The full result of one `validate` call.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub risk_level: RiskLevel,
    pub compliance_status: ComplianceStatus,
    pub score: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub flags: Vec<String>,
}
