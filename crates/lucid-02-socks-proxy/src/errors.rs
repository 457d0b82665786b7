//! Error types for the SOCKS proxy manager.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocksError {
    #[error("proxy unreachable")]
    ProxyUnreachable,

    #[error("proxy authentication rejected")]
    AuthRejected,

    #[error("socks protocol error: {0}")]
    Protocol(String),

    #[error("no proxy connection {0}")]
    ProxyNotFound(String),

    #[error("no tunnel {0}")]
    TunnelNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
