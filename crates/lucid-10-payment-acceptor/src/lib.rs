//! # Payment Acceptor
//!
//! Lifecycle manager for payment requests that gate session activation
//! and other paid services (spec.md §4.6): creation-time validation,
//! chain-watcher observation matching, confirmation polling against a
//! required threshold, expiry, and create-time risk scoring that
//! routes high-risk requests to manual review downstream.

#![warn(missing_docs)]
#![allow(missing_docs)]

mod acceptor;
mod errors;
mod risk;
mod validation;

pub use acceptor::{
    ObservedTransaction, PaymentAcceptor, PaymentDraft, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REQUIRED_CONFIRMATIONS, DEFAULT_RISK_THRESHOLD,
};
pub use errors::{AcceptorError, RejectionReason};
pub use validation::ValidationRules;

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_bus::InMemoryEventBus;
    use lucid_types::{PaymentLinkage, PaymentMethod, PaymentPriority, PaymentStatus, PaymentType, SessionId};
    use std::sync::Arc;

    fn acceptor() -> PaymentAcceptor {
        PaymentAcceptor::new(ValidationRules::default(), Arc::new(InMemoryEventBus::new()))
    }

    fn draft(session: SessionId) -> PaymentDraft {
        PaymentDraft {
            payment_type: PaymentType::Session,
            method: PaymentMethod::UsdtTrc20,
            amount: 25.0,
            token_type: "USDT".into(),
            recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
            sender_address: None,
            linkage: PaymentLinkage::Session(session),
            priority: PaymentPriority::Normal,
            expires_at: Some(lucid_types::now_unix() + 3600),
            failed_compliance_checks: 0,
        }
    }

    #[tokio::test]
    async fn create_then_observe_then_confirm_happy_path() {
        let acc = acceptor();
        let session = SessionId::new();
        let (id, status) = acc.create(draft(session)).await.unwrap();
        assert_eq!(status, PaymentStatus::Pending);

        let matched = acc
            .observe(ObservedTransaction {
                txid: "tx-1".into(),
                token_type: "USDT".into(),
                amount: 25.0,
                recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
            })
            .await;
        assert_eq!(matched, Some(id));
        assert_eq!(acc.get(id).await.unwrap().0.status, PaymentStatus::Received);

        let status = acc.record_confirmations(id, 19, false).await.unwrap();
        assert_eq!(status, PaymentStatus::Confirmed);
        assert!(acc.get(id).await.unwrap().0.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn below_threshold_confirmations_stay_received() {
        let acc = acceptor();
        let session = SessionId::new();
        let (id, _) = acc.create(draft(session)).await.unwrap();
        acc.observe(ObservedTransaction {
            txid: "tx-1".into(),
            token_type: "USDT".into(),
            amount: 25.0,
            recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
        })
        .await;

        let status = acc.record_confirmations(id, 3, false).await.unwrap();
        assert_eq!(status, PaymentStatus::Received);
    }

    #[tokio::test]
    async fn chain_reported_failure_moves_to_failed() {
        let acc = acceptor();
        let session = SessionId::new();
        let (id, _) = acc.create(draft(session)).await.unwrap();
        acc.observe(ObservedTransaction {
            txid: "tx-1".into(),
            token_type: "USDT".into(),
            amount: 25.0,
            recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
        })
        .await;

        let status = acc.record_confirmations(id, 0, true).await.unwrap();
        assert_eq!(status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_it_enters_the_store() {
        let acc = acceptor();
        let mut bad = draft(SessionId::new());
        bad.amount = -1.0;
        let err = acc.create(bad).await.unwrap_err();
        assert!(!err.is_empty());
    }

    #[tokio::test]
    async fn pending_past_expiry_transitions_to_expired() {
        let acc = acceptor();
        let mut d = draft(SessionId::new());
        d.expires_at = Some(100);
        let (id, _) = acc.create(d).await.unwrap();

        let expired = acc.expire_if_due(id, 200).await.unwrap();
        assert!(expired);
        assert_eq!(acc.get(id).await.unwrap().0.status, PaymentStatus::Expired);
    }

    #[tokio::test]
    async fn non_matching_observation_does_not_transition_anything() {
        let acc = acceptor();
        acc.create(draft(SessionId::new())).await.unwrap();

        let matched = acc
            .observe(ObservedTransaction {
                txid: "tx-1".into(),
                token_type: "USDT".into(),
                amount: 999.0,
                recipient_address: "Txxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".into(),
            })
            .await;
        assert_eq!(matched, None);
    }

    #[test]
    fn high_risk_scores_route_to_manual_review() {
        let acc = acceptor();
        assert!(acc.requires_manual_review(0.9));
        assert!(!acc.requires_manual_review(0.1));
    }
}
