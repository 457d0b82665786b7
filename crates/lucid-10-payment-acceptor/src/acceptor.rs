//! `PaymentAcceptor`: lifecycle manager for payment requests
//! (spec.md §4.6).

use crate::errors::{AcceptorError, RejectionReason};
use crate::risk;
use crate::validation::{validate, ValidationRules};
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_types::{
    now_unix, PaymentLinkage, PaymentMethod, PaymentPriority, PaymentRequest, PaymentStatus,
    PaymentType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Confirmation count required to move RECEIVED -> CONFIRMED.
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u32 = 19;
/// Default chain-watcher poll interval while a payment is RECEIVED.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Risk scores at or above this threshold route to MANUAL_REVIEW
/// instead of straight to PROCESSED once validated.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.7;

struct PaymentRecord {
    request: PaymentRequest,
    risk_score: f64,
}

/// A chain observation the watcher reports via [`PaymentAcceptor::observe`].
#[derive(Debug, Clone)]
pub struct ObservedTransaction {
    pub txid: String,
    pub token_type: String,
    pub amount: f64,
    pub recipient_address: String,
}

/// Everything `create` needs beyond the auto-derived id/status/timestamps.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub amount: f64,
    pub token_type: String,
    pub recipient_address: String,
    pub sender_address: Option<String>,
    pub linkage: PaymentLinkage,
    pub priority: PaymentPriority,
    pub expires_at: Option<u64>,
    pub failed_compliance_checks: u32,
}

pub struct PaymentAcceptor {
    rules: ValidationRules,
    required_confirmations: u32,
    risk_threshold: f64,
    bus: Arc<dyn EventPublisher>,
    requests: RwLock<HashMap<Uuid, PaymentRecord>>,
}

impl PaymentAcceptor {
    pub fn new(rules: ValidationRules, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            rules,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            bus,
            requests: RwLock::new(HashMap::new()),
        }
    }

    async fn publish(&self, event: LucidEvent) {
        self.bus.publish(event).await;
    }

    /// Validates and, on success, registers a new request in `PENDING`.
    /// Returns every validation failure on rejection rather than the
    /// first.
    pub async fn create(
        &self,
        draft: PaymentDraft,
    ) -> Result<(Uuid, PaymentStatus), Vec<RejectionReason>> {
        let reasons = validate(
            &self.rules,
            draft.amount,
            &draft.token_type,
            draft.payment_type,
            &draft.recipient_address,
            draft.sender_address.as_deref(),
            &draft.linkage,
        );
        if !reasons.is_empty() {
            return Err(reasons);
        }

        let risk_score = risk::score(draft.amount, draft.payment_type, draft.failed_compliance_checks);
        let payment_id = Uuid::new_v4();
        let request = PaymentRequest {
            payment_id,
            payment_type: draft.payment_type,
            method: draft.method,
            amount: draft.amount,
            token_type: draft.token_type,
            recipient_address: draft.recipient_address,
            sender_address: draft.sender_address,
            linkage: draft.linkage,
            priority: draft.priority,
            expires_at: draft.expires_at,
            status: PaymentStatus::Pending,
            created_at: now_unix(),
            confirmation_count: 0,
            confirmed_at: None,
            observed_txid: None,
        };

        self.requests
            .write()
            .await
            .insert(payment_id, PaymentRecord { request, risk_score });
        Ok((payment_id, PaymentStatus::Pending))
    }

    /// A snapshot of the current request state, plus its risk score.
    pub async fn get(&self, payment_id: Uuid) -> Option<(PaymentRequest, f64)> {
        self.requests
            .read()
            .await
            .get(&payment_id)
            .map(|r| (r.request.clone(), r.risk_score))
    }

    /// Matches an on-chain observation against every `PENDING` request
    /// by exact `(token, amount, recipient)` and transitions the first
    /// match to `RECEIVED`. Expired requests never match.
    pub async fn observe(&self, tx: ObservedTransaction) -> Option<Uuid> {
        let mut requests = self.requests.write().await;
        let matched_id = requests
            .values()
            .find(|r| {
                r.request.status == PaymentStatus::Pending
                    && r.request.token_type == tx.token_type
                    && r.request.amount == tx.amount
                    && r.request.recipient_address == tx.recipient_address
            })
            .map(|r| r.request.payment_id);

        if let Some(id) = matched_id {
            let record = requests.get_mut(&id).expect("matched id exists");
            let from = record.request.status;
            record.request.status = PaymentStatus::Received;
            record.request.observed_txid = Some(tx.txid.clone());
            drop(requests);
            self.publish(LucidEvent::PaymentObserved { payment_id: id, txid: tx.txid })
                .await;
            self.publish(LucidEvent::PaymentStatusChanged {
                payment_id: id,
                from,
                to: PaymentStatus::Received,
            })
            .await;
        }
        matched_id
    }

    /// Applies a fresh confirmation count from the chain watcher.
    /// Transitions RECEIVED -> CONFIRMED at the threshold, firing the
    /// downstream notification exactly once, or -> FAILED if the
    /// watcher reports the transaction failed.
    pub async fn record_confirmations(
        &self,
        payment_id: Uuid,
        confirmation_count: u32,
        chain_reports_failed: bool,
    ) -> Result<PaymentStatus, AcceptorError> {
        let (from, to, linked_session) = {
            let mut requests = self.requests.write().await;
            let record = requests
                .get_mut(&payment_id)
                .ok_or(AcceptorError::NotFound(payment_id))?;
            if record.request.status != PaymentStatus::Received {
                return Err(AcceptorError::NotAwaitingConfirmation(payment_id));
            }

            let from = record.request.status;
            record.request.confirmation_count = confirmation_count;

            let to = if chain_reports_failed {
                PaymentStatus::Failed
            } else if confirmation_count >= self.required_confirmations {
                PaymentStatus::Confirmed
            } else {
                PaymentStatus::Received
            };
            record.request.status = to;
            if to == PaymentStatus::Confirmed {
                record.request.confirmed_at = Some(now_unix());
            }

            let linked_session = match &record.request.linkage {
                PaymentLinkage::Session(id) if to == PaymentStatus::Confirmed => Some(*id),
                _ => None,
            };
            (from, to, linked_session)
        };

        if from != to {
            self.publish(LucidEvent::PaymentStatusChanged { payment_id, from, to }).await;
        }
        if to == PaymentStatus::Confirmed {
            self.publish(LucidEvent::PaymentConfirmed { payment_id, linked_session }).await;
        }
        Ok(to)
    }

    /// Expires a still-`PENDING` request whose `expires_at` has
    /// passed. A no-op if the request isn't `PENDING` or hasn't
    /// reached its deadline.
    pub async fn expire_if_due(&self, payment_id: Uuid, now: u64) -> Result<bool, AcceptorError> {
        let mut requests = self.requests.write().await;
        let record = requests.get_mut(&payment_id).ok_or(AcceptorError::NotFound(payment_id))?;

        let due = record.request.status == PaymentStatus::Pending
            && record.request.expires_at.is_some_and(|deadline| now > deadline);
        if !due {
            return Ok(false);
        }

        record.request.status = PaymentStatus::Expired;
        drop(requests);
        self.publish(LucidEvent::PaymentStatusChanged {
            payment_id,
            from: PaymentStatus::Pending,
            to: PaymentStatus::Expired,
        })
        .await;
        Ok(true)
    }

    /// Whether this risk score routes the request to manual review
    /// once validated, instead of straight to processing.
    #[must_use]
    pub fn requires_manual_review(&self, risk_score: f64) -> bool {
        risk_score >= self.risk_threshold
    }
}
