//! Domain types for proxy connections and tunnels.

use std::time::Duration;

/// SOCKS protocol version. Only version 5 is actually dialed; 4/4a are
/// accepted in config for completeness and rejected at `open_proxy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksVersion {
    V4,
    V4a,
    V5,
}

/// Retry policy for proxy connection attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Configuration for opening a proxy connection.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub version: SocksVersion,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// Destination used to validate reachability when the proxy is
    /// opened. Defaults to discard-port loopback.
    pub sentinel_host: String,
    pub sentinel_port: u16,
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            version: SocksVersion::V5,
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::default(),
            sentinel_host: "127.0.0.1".to_string(),
            sentinel_port: 9,
        }
    }
}

/// Health state of one proxy connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyHealth {
    Healthy,
    Error { last_error: String },
}

/// Transport protocol a tunnel forwards. TCP only is in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelProtocol {
    Tcp,
}

/// A request to open a local-to-remote tunnel through a proxy.
#[derive(Debug, Clone)]
pub struct TunnelRequest {
    pub local_host: String,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
    pub protocol: TunnelProtocol,
    pub proxy_connection_id: String,
}

/// Snapshot of one proxy connection.
#[derive(Debug, Clone)]
pub struct ProxyConnectionSnapshot {
    pub id: String,
    pub config_host: String,
    pub config_port: u16,
    pub health: ProxyHealth,
}

/// Snapshot of one tunnel.
#[derive(Debug, Clone)]
pub struct TunnelSnapshot {
    pub id: String,
    pub local_host: String,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
    pub proxy_connection_id: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub closed: bool,
}
