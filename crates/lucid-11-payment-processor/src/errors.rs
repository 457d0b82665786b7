//! Error types for job lookup and settlement execution.

use thiserror::Error;
use uuid::Uuid;

/// Failure modes a [`crate::SettlementPort`] adapter reports back to the
/// processor. The adapter owns its own timeout budget: it is the only
/// party that knows whether a txid was observed before giving up.
#[derive(Debug, Clone, Error)]
pub enum SettlementOutcome {
    /// Settlement completed and the chain accepted the transaction.
    #[error("settled as {0}")]
    Succeeded(String),

    /// The settlement rail explicitly rejected the payment.
    #[error("rejected: {0}")]
    Rejected(String),

    /// No answer arrived within the adapter's timeout budget. Carries
    /// whatever transaction id was observed in flight, if any.
    #[error("timed out (observed_txid={observed_txid:?})")]
    TimedOut { observed_txid: Option<String> },
}

/// Errors raised by [`crate::PaymentProcessor`] itself, distinct from
/// settlement failures which are tracked per-job instead.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error("job {0} is not in a schedulable state")]
    NotSchedulable(Uuid),
}
