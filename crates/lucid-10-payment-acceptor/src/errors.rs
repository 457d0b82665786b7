//! Create-time validation failures (spec.md §4.6). Each variant names
//! the exact reason a request was rejected, since `create` returns the
//! full list rather than failing fast on the first problem.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RejectionReason {
    #[error("amount {amount} outside allowed range [{min}, {max}]")]
    AmountOutOfRange { amount: f64, min: f64, max: f64 },

    #[error("token {0} is not in the supported set")]
    UnsupportedToken(String),

    #[error("recipient address is malformed")]
    MalformedRecipient,

    #[error("sender address is malformed")]
    MalformedSender,

    #[error("payment type {0:?} requires a session linkage")]
    MissingRequiredLinkage(lucid_types::PaymentType),

    #[error("recipient address {0} is on the blocklist")]
    Blocklisted(String),
}

#[derive(Debug, Error)]
pub enum AcceptorError {
    #[error("no payment request with id {0}")]
    NotFound(uuid::Uuid),

    #[error("payment {0} is not in RECEIVED; cannot poll confirmations")]
    NotAwaitingConfirmation(uuid::Uuid),
}
