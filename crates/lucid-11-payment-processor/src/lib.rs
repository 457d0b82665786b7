//! # Payment Processor
//!
//! Routes VALIDATED payment requests to a settlement router and drives
//! them through IMMEDIATE/BATCH/SCHEDULED/CONDITIONAL execution with
//! bounded retry (spec.md §4.7). Settlement timeouts are retried only
//! after an injected [`NonInclusionPort`] confirms the previously
//! observed transaction never landed, so a retry can never double-pay.

#![warn(missing_docs)]
#![allow(missing_docs)]

mod errors;
mod ports;
mod processor;
mod router;

pub use errors::{ProcessorError, SettlementOutcome};
pub use ports::{AlwaysConfirmNonInclusion, NonInclusionPort, RecordingSettlementPort, SettlementPort};
pub use processor::{JobStatus, PaymentProcessor, ProcessorConfig};
pub use router::{default_rules, route, ExecutionModel, RoutingAction, RoutingDecision, RoutingRule, RouterTag};

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_bus::InMemoryEventBus;
    use lucid_types::{now_unix, PaymentLinkage, PaymentMethod, PaymentPriority, PaymentRequest, PaymentStatus, PaymentType, SessionId};
    use std::sync::Arc;
    use uuid::Uuid;

    fn request(payment_type: PaymentType, amount: f64, priority: PaymentPriority) -> PaymentRequest {
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
            observed_txid: None,
        }
    }

    fn processor(settlement: Arc<dyn SettlementPort>) -> PaymentProcessor {
        PaymentProcessor::new(
            default_rules(),
            ProcessorConfig::default(),
            Arc::new(InMemoryEventBus::new()),
            settlement,
            Arc::new(AlwaysConfirmNonInclusion { confirmed: true }),
        )
    }

    #[tokio::test]
    async fn immediate_job_settles_on_submit() {
        let settlement = Arc::new(RecordingSettlementPort::new());
        let p = processor(settlement.clone());
        let job_id = p.submit(request(PaymentType::Session, 25.0, PaymentPriority::Normal), None).await;
        assert_eq!(p.status(job_id).await, Some(JobStatus::Succeeded));
        assert_eq!(settlement.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_settlement_retries_up_to_the_configured_attempts() {
        let settlement = Arc::new(RecordingSettlementPort::scripted(vec![
            SettlementOutcome::Rejected("insufficient liquidity".into()),
            SettlementOutcome::Rejected("insufficient liquidity".into()),
            SettlementOutcome::Rejected("insufficient liquidity".into()),
            SettlementOutcome::Rejected("insufficient liquidity".into()),
        ]));
        let p = processor(settlement.clone());
        let job_id = p.submit(request(PaymentType::Session, 25.0, PaymentPriority::Normal), None).await;
        assert_eq!(p.status(job_id).await, Some(JobStatus::Failed));
        // 1 initial try + 3 retries (DEFAULT_RETRY_ATTEMPTS) = 4 total.
        assert_eq!(settlement.attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_with_observed_txid_blocks_retry_until_non_inclusion_confirmed() {
        let settlement = Arc::new(RecordingSettlementPort::scripted(vec![SettlementOutcome::TimedOut {
            observed_txid: Some("tx-maybe".into()),
        }]));
        let p = PaymentProcessor::new(
            default_rules(),
            ProcessorConfig::default(),
            Arc::new(InMemoryEventBus::new()),
            settlement.clone(),
            Arc::new(AlwaysConfirmNonInclusion { confirmed: false }),
        );
        let job_id = p.submit(request(PaymentType::Session, 25.0, PaymentPriority::Normal), None).await;
        assert_eq!(p.status(job_id).await, Some(JobStatus::AwaitingNonInclusion));
        assert_eq!(settlement.attempts(), 1);
    }

    #[tokio::test]
    async fn high_value_job_waits_for_manual_approval_before_running() {
        let settlement = Arc::new(RecordingSettlementPort::new());
        let p = processor(settlement.clone());
        let job_id = p.submit(request(PaymentType::Session, 50_000.0, PaymentPriority::Normal), None).await;
        assert_eq!(p.status(job_id).await, Some(JobStatus::Queued));
        assert_eq!(settlement.attempts(), 0);

        p.approve(job_id).await.unwrap();
        assert_eq!(p.status(job_id).await, Some(JobStatus::Succeeded));
        assert_eq!(settlement.attempts(), 1);
    }

    #[tokio::test]
    async fn donation_batches_until_a_drain_tick() {
        let settlement = Arc::new(RecordingSettlementPort::new());
        let p = processor(settlement.clone());
        let job_id = p.submit(request(PaymentType::Donation, 5.0, PaymentPriority::Normal), None).await;
        assert_eq!(p.status(job_id).await, Some(JobStatus::Queued));

        let results = p.drain_batch().await;
        assert_eq!(results, vec![(job_id, JobStatus::Succeeded)]);
    }

    #[tokio::test]
    async fn scheduled_job_waits_for_its_timestamp() {
        let settlement = Arc::new(RecordingSettlementPort::new());
        let p = processor(settlement.clone());
        let job_id = p
            .submit(request(PaymentType::Governance, 20_000.0, PaymentPriority::Normal), Some(1_000))
            .await;
        p.approve(job_id).await.unwrap();
        assert_eq!(p.status(job_id).await, Some(JobStatus::Queued));

        assert!(p.drain_scheduled(999).await.is_empty());
        let results = p.drain_scheduled(1_000).await;
        assert_eq!(results, vec![(job_id, JobStatus::Succeeded)]);
    }

    #[tokio::test]
    async fn conditional_job_runs_only_once_its_precondition_holds() {
        let settlement = Arc::new(RecordingSettlementPort::new());
        let p = PaymentProcessor::new(
            vec![RoutingRule {
                priority: 1,
                min_amount: None,
                max_amount: None,
                payment_type: None,
                priority_level: None,
                requires_linkage: false,
                action: RoutingAction {
                    router: None,
                    execution_model: Some(ExecutionModel::Conditional),
                    requires_manual_approval: None,
                },
            }],
            ProcessorConfig::default(),
            Arc::new(InMemoryEventBus::new()),
            settlement.clone(),
            Arc::new(AlwaysConfirmNonInclusion { confirmed: true }),
        );
        let job_id = p.submit(request(PaymentType::Session, 25.0, PaymentPriority::Normal), None).await;

        assert!(p.drain_conditional(|_| false).await.is_empty());
        let results = p.drain_conditional(|_| true).await;
        assert_eq!(results, vec![(job_id, JobStatus::Succeeded)]);
    }
}
