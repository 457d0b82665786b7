//! SOCKS5 proxy connections and tunnels for routing traffic over Tor.

mod connect;
mod errors;
mod handshake;
mod proxy_manager;
mod types;

pub use connect::socks5_connect;
pub use errors::SocksError;
pub use handshake::Address;
pub use proxy_manager::{SocksProxyManager, DEFAULT_HEALTH_CHECK_INTERVAL};
pub use types::{
    ProxyConfig, ProxyConnectionSnapshot, ProxyHealth, RetryPolicy, SocksVersion, TunnelProtocol,
    TunnelRequest, TunnelSnapshot,
};
