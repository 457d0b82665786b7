//! Adapter boundary between the processor and whatever settlement rail
//! (`v0`, `kyc_router`, ...) actually moves funds on-chain.

use crate::errors::SettlementOutcome;
use crate::router::RouterTag;
use async_trait::async_trait;
use lucid_types::PaymentRequest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Executes settlement for one request through a named router. The
/// adapter owns its own timeout budget (processing vs. settlement) and
/// must report whatever txid it observed in flight if it times out,
/// since only it can see the in-flight state.
#[async_trait]
pub trait SettlementPort: Send + Sync {
    async fn settle(&self, router: RouterTag, request: &PaymentRequest) -> SettlementOutcome;
}

/// Confirms, out of band, that a previously observed txid never landed
/// on-chain. Gates retries on jobs where a txid was recorded, so a
/// retry never risks paying twice for the same settlement.
#[async_trait]
pub trait NonInclusionPort: Send + Sync {
    async fn confirm_non_inclusion(&self, txid: &str) -> bool;
}

/// In-memory `SettlementPort` for tests and local runs: always
/// succeeds with a deterministic txid unless scripted otherwise.
pub struct RecordingSettlementPort {
    attempts: AtomicU64,
    script: Mutex<Vec<SettlementOutcome>>,
}

impl RecordingSettlementPort {
    #[must_use]
    pub fn new() -> Self {
        Self { attempts: AtomicU64::new(0), script: Mutex::new(Vec::new()) }
    }

    /// Outcomes are consumed front-to-back, one per `settle` call; once
    /// exhausted, calls fall back to an immediate success.
    #[must_use]
    pub fn scripted(outcomes: Vec<SettlementOutcome>) -> Self {
        Self { attempts: AtomicU64::new(0), script: Mutex::new(outcomes) }
    }

    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Default for RecordingSettlementPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementPort for RecordingSettlementPort {
    async fn settle(&self, _router: RouterTag, request: &PaymentRequest) -> SettlementOutcome {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let mut script = self.script.lock().expect("settlement script poisoned");
        if script.is_empty() {
            SettlementOutcome::Succeeded(format!("settled-{}", request.payment_id))
        } else {
            script.remove(0)
        }
    }
}

/// In-memory `NonInclusionPort` for tests: always confirms
/// non-inclusion unless told otherwise.
pub struct AlwaysConfirmNonInclusion {
    pub confirmed: bool,
}

#[async_trait]
impl NonInclusionPort for AlwaysConfirmNonInclusion {
    async fn confirm_non_inclusion(&self, _txid: &str) -> bool {
        self.confirmed
    }
}
