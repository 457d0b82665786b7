//! Rule-based routing: picks a settlement router and execution model
//! for a validated payment request (spec.md §4.7).

use lucid_types::{PaymentLinkage, PaymentPriority, PaymentRequest, PaymentType};

/// Settlement router a job is dispatched through. Named after the
/// concrete tags `payment_processor.py` uses rather than a free string
/// (SPEC_FULL.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterTag {
    V0,
    KycRouter,
}

/// How a routed job is scheduled for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionModel {
    Immediate,
    Batch,
    Scheduled,
    Conditional,
}

/// The resolved outcome of evaluating the rule set against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub router: RouterTag,
    pub execution_model: ExecutionModel,
    pub requires_manual_approval: bool,
}

impl Default for RoutingDecision {
    fn default() -> Self {
        Self {
            router: RouterTag::V0,
            execution_model: ExecutionModel::Immediate,
            requires_manual_approval: false,
        }
    }
}

/// The subset of a rule's action a match contributes. `None` means the
/// rule has no opinion on that field and leaves it to a lower-priority
/// rule (or the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingAction {
    pub router: Option<RouterTag>,
    pub execution_model: Option<ExecutionModel>,
    pub requires_manual_approval: Option<bool>,
}

/// One entry in the ordered rule set. Matching is conjunctive over the
/// populated predicates; an absent predicate always matches.
pub struct RoutingRule {
    pub priority: u32,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub payment_type: Option<PaymentType>,
    pub priority_level: Option<PaymentPriority>,
    pub requires_linkage: bool,
    pub action: RoutingAction,
}

impl RoutingRule {
    fn matches(&self, request: &PaymentRequest) -> bool {
        if let Some(min) = self.min_amount {
            if request.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if request.amount > max {
                return false;
            }
        }
        if let Some(ty) = self.payment_type {
            if request.payment_type != ty {
                return false;
            }
        }
        if let Some(level) = self.priority_level {
            if request.priority != level {
                return false;
            }
        }
        if self.requires_linkage && matches!(request.linkage, PaymentLinkage::None) {
            return false;
        }
        true
    }
}

/// Evaluates every rule against `request`, applying matches from lowest
/// to highest priority so a higher-priority rule overrides a field a
/// lower-priority rule also set. Rules that set no fields contribute
/// nothing and never mask the default.
#[must_use]
pub fn route(rules: &[RoutingRule], request: &PaymentRequest) -> RoutingDecision {
    let mut matched: Vec<&RoutingRule> = rules.iter().filter(|r| r.matches(request)).collect();
    matched.sort_by_key(|r| r.priority);

    let mut decision = RoutingDecision::default();
    for rule in matched {
        if let Some(router) = rule.action.router {
            decision.router = router;
        }
        if let Some(model) = rule.action.execution_model {
            decision.execution_model = model;
        }
        if let Some(approval) = rule.action.requires_manual_approval {
            decision.requires_manual_approval = approval;
        }
    }
    decision
}

/// A reasonable default rule set: high-value and governance/custom
/// payments route through KYC with manual approval, donations batch,
/// everything else falls through to immediate + v0.
#[must_use]
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            priority: 10,
            min_amount: Some(10_000.0),
            max_amount: None,
            payment_type: None,
            priority_level: None,
            requires_linkage: false,
            action: RoutingAction {
                router: Some(RouterTag::KycRouter),
                execution_model: None,
                requires_manual_approval: Some(true),
            },
        },
        RoutingRule {
            priority: 9,
            min_amount: None,
            max_amount: None,
            payment_type: Some(PaymentType::Governance),
            priority_level: None,
            requires_linkage: false,
            action: RoutingAction {
                router: Some(RouterTag::KycRouter),
                execution_model: Some(ExecutionModel::Scheduled),
                requires_manual_approval: Some(true),
            },
        },
        RoutingRule {
            priority: 5,
            min_amount: None,
            max_amount: None,
            payment_type: Some(PaymentType::Donation),
            priority_level: None,
            requires_linkage: false,
            action: RoutingAction {
                router: None,
                execution_model: Some(ExecutionModel::Batch),
                requires_manual_approval: None,
            },
        },
        RoutingRule {
            priority: 1,
            min_amount: None,
            max_amount: None,
            payment_type: None,
            priority_level: Some(PaymentPriority::Urgent),
            requires_linkage: false,
            action: RoutingAction {
                router: None,
                execution_model: Some(ExecutionModel::Immediate),
                requires_manual_approval: None,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_types::{now_unix, PaymentMethod, PaymentStatus, SessionId};
    use uuid::Uuid;

    fn request(amount: f64, payment_type: PaymentType, priority: PaymentPriority) -> PaymentRequest {
        PaymentRequest {
            payment_id: Uuid::new_v4(),
            payment_type,
            method: PaymentMethod::UsdtTrc20,
            amount,
            token_type: "USDT".into(),
            recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
            sender_address: None,
            linkage: PaymentLinkage::Session(SessionId::new()),
            priority,
            expires_at: None,
            status: PaymentStatus::Validated,
            created_at: now_unix(),
            confirmation_count: 19,
            confirmed_at: Some(now_unix()),
            observed_txid: Some("tx-1".into()),
        }
    }

    #[test]
    fn default_fallback_is_immediate_v0() {
        let decision = route(&default_rules(), &request(10.0, PaymentType::Session, PaymentPriority::Normal));
        assert_eq!(decision.router, RouterTag::V0);
        assert_eq!(decision.execution_model, ExecutionModel::Immediate);
        assert!(!decision.requires_manual_approval);
    }

    #[test]
    fn high_value_routes_through_kyc_with_manual_approval() {
        let decision = route(&default_rules(), &request(20_000.0, PaymentType::Session, PaymentPriority::Normal));
        assert_eq!(decision.router, RouterTag::KycRouter);
        assert!(decision.requires_manual_approval);
    }

    #[test]
    fn higher_priority_rule_wins_the_conflicting_field() {
        // Governance (priority 9) sets Scheduled; high-value (priority 10) doesn't
        // touch execution_model, so governance's Scheduled should survive even
        // though the high-value rule's router/approval also apply.
        let decision = route(&default_rules(), &request(20_000.0, PaymentType::Governance, PaymentPriority::Normal));
        assert_eq!(decision.execution_model, ExecutionModel::Scheduled);
        assert_eq!(decision.router, RouterTag::KycRouter);
    }

    #[test]
    fn donation_batches_by_default() {
        let decision = route(&default_rules(), &request(5.0, PaymentType::Donation, PaymentPriority::Normal));
        assert_eq!(decision.execution_model, ExecutionModel::Batch);
        assert_eq!(decision.router, RouterTag::V0);
    }
}
