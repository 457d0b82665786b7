//! Error types for the Onion Service Manager.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnionError {
    #[error("tor control channel is not available")]
    TorUnavailable,

    #[error("supplied private key is malformed: {0}")]
    KeyInvalid(String),

    #[error("service name '{0}' collides with an existing non-ephemeral record")]
    Conflict(String),

    #[error("no onion service record for id {0}")]
    NotFound(String),

    #[error("tor control protocol error: {0}")]
    ControlProtocol(String),

    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
