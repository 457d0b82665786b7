//! The SOCKS Proxy Manager: proxy connections and the tunnels
//! forwarded through them.

use crate::connect::socks5_connect;
use crate::errors::SocksError;
use crate::types::{
    ProxyConfig, ProxyConnectionSnapshot, ProxyHealth, SocksVersion, TunnelProtocol,
    TunnelRequest, TunnelSnapshot,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Default interval for the background reachability probe.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

struct ProxyEntry {
    config: ProxyConfig,
    health: Arc<RwLock<ProxyHealth>>,
    tunnels: Vec<String>,
    health_task: JoinHandle<()>,
}

struct TunnelHandle {
    request: TunnelRequest,
    bytes_sent: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    listener_task: JoinHandle<()>,
}

/// Owns every open proxy connection and the tunnels forwarded through
/// them.
pub struct SocksProxyManager {
    proxies: Arc<RwLock<HashMap<String, ProxyEntry>>>,
    tunnels: Arc<RwLock<HashMap<String, TunnelHandle>>>,
    health_check_interval: Duration,
}

impl Default for SocksProxyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SocksProxyManager {
    pub fn new() -> Self {
        Self::with_health_check_interval(DEFAULT_HEALTH_CHECK_INTERVAL)
    }

    pub fn with_health_check_interval(interval: Duration) -> Self {
        Self {
            proxies: Arc::new(RwLock::new(HashMap::new())),
            tunnels: Arc::new(RwLock::new(HashMap::new())),
            health_check_interval: interval,
        }
    }

    /// Opens a proxy connection, validating reachability with a
    /// handshake against the sentinel destination before returning.
    pub async fn open_proxy(&self, config: ProxyConfig) -> Result<String, SocksError> {
        if config.version != SocksVersion::V5 {
            return Err(SocksError::Protocol(
                "only socks5 is dialed; v4/v4a are rejected".to_string(),
            ));
        }

        let proxy_addr = format!("{}:{}", config.host, config.port);
        let credentials = config
            .username
            .as_deref()
            .zip(config.password.as_deref());
        socks5_connect(&proxy_addr, credentials, &config.sentinel_host, config.sentinel_port)
            .await?;

        let id = uuid::Uuid::new_v4().to_string();
        let health = Arc::new(RwLock::new(ProxyHealth::Healthy));

        let health_task = {
            let health = health.clone();
            let proxy_addr = proxy_addr.clone();
            let sentinel_host = config.sentinel_host.clone();
            let sentinel_port = config.sentinel_port;
            let username = config.username.clone();
            let password = config.password.clone();
            let interval = self.health_check_interval;

            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    let creds = username.as_deref().zip(password.as_deref());
                    match socks5_connect(&proxy_addr, creds, &sentinel_host, sentinel_port).await {
                        Ok(_) => *health.write() = ProxyHealth::Healthy,
                        Err(e) => {
                            *health.write() = ProxyHealth::Error {
                                last_error: e.to_string(),
                            }
                        }
                    }
                }
            })
        };

        self.proxies.write().insert(
            id.clone(),
            ProxyEntry {
                config,
                health,
                tunnels: Vec::new(),
                health_task,
            },
        );
        Ok(id)
    }

    /// Spawns a local listener that forwards each accepted connection
    /// through the named proxy to the tunnel's remote address.
    pub async fn open_tunnel(&self, request: TunnelRequest) -> Result<String, SocksError> {
        let TunnelProtocol::Tcp = request.protocol;

        let (proxy_addr, username, password) = {
            let proxies = self.proxies.read();
            let entry = proxies
                .get(&request.proxy_connection_id)
                .ok_or_else(|| SocksError::ProxyNotFound(request.proxy_connection_id.clone()))?;
            (
                format!("{}:{}", entry.config.host, entry.config.port),
                entry.config.username.clone(),
                entry.config.password.clone(),
            )
        };

        let bind_addr = format!("{}:{}", request.local_host, request.local_port);
        let listener = TcpListener::bind(&bind_addr).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let bytes_sent = Arc::new(AtomicU64::new(0));
        let bytes_received = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let listener_task = {
            let proxies = self.proxies.clone();
            let proxy_id = request.proxy_connection_id.clone();
            let remote_host = request.remote_host.clone();
            let remote_port = request.remote_port;
            let bytes_sent = bytes_sent.clone();
            let bytes_received = bytes_received.clone();
            let closed = closed.clone();

            tokio::spawn(async move {
                loop {
                    if closed.load(Ordering::Relaxed) {
                        return;
                    }

                    let (mut client, _peer) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => return,
                    };

                    let healthy = matches!(
                        proxies.read().get(&proxy_id).map(|e| e.health.read().clone()),
                        Some(ProxyHealth::Healthy)
                    );
                    if !healthy {
                        continue;
                    }

                    let proxy_addr = proxy_addr.clone();
                    let username = username.clone();
                    let password = password.clone();
                    let remote_host = remote_host.clone();
                    let bytes_sent = bytes_sent.clone();
                    let bytes_received = bytes_received.clone();

                    tokio::spawn(async move {
                        let credentials = username.as_deref().zip(password.as_deref());
                        let mut remote =
                            match socks5_connect(&proxy_addr, credentials, &remote_host, remote_port).await {
                                Ok(stream) => stream,
                                Err(_) => return,
                            };

                        if let Ok((from_client, from_remote)) =
                            tokio::io::copy_bidirectional(&mut client, &mut remote).await
                        {
                            bytes_sent.fetch_add(from_client, Ordering::Relaxed);
                            bytes_received.fetch_add(from_remote, Ordering::Relaxed);
                        }
                    });
                }
            })
        };

        self.tunnels.write().insert(
            id.clone(),
            TunnelHandle {
                request: request.clone(),
                bytes_sent,
                bytes_received,
                closed,
                listener_task,
            },
        );
        if let Some(entry) = self.proxies.write().get_mut(&request.proxy_connection_id) {
            entry.tunnels.push(id.clone());
        }
        Ok(id)
    }

    /// Idempotent: returns `false` if the tunnel is already gone.
    pub fn close_tunnel(&self, tunnel_id: &str) -> bool {
        match self.tunnels.write().remove(tunnel_id) {
            Some(handle) => {
                handle.closed.store(true, Ordering::Relaxed);
                handle.listener_task.abort();
                true
            }
            None => false,
        }
    }

    /// Idempotent: closes every tunnel on this proxy first, then the
    /// proxy itself.
    pub fn close_proxy(&self, proxy_id: &str) -> bool {
        let tunnel_ids = match self.proxies.write().remove(proxy_id) {
            Some(entry) => {
                entry.health_task.abort();
                entry.tunnels
            }
            None => return false,
        };
        for tunnel_id in tunnel_ids {
            self.close_tunnel(&tunnel_id);
        }
        true
    }

    pub fn list_proxies(&self) -> Vec<ProxyConnectionSnapshot> {
        self.proxies
            .read()
            .iter()
            .map(|(id, entry)| ProxyConnectionSnapshot {
                id: id.clone(),
                config_host: entry.config.host.clone(),
                config_port: entry.config.port,
                health: entry.health.read().clone(),
            })
            .collect()
    }

    pub fn list_tunnels(&self) -> Vec<TunnelSnapshot> {
        self.tunnels
            .read()
            .iter()
            .map(|(id, handle)| TunnelSnapshot {
                id: id.clone(),
                local_host: handle.request.local_host.clone(),
                local_port: handle.request.local_port,
                remote_host: handle.request.remote_host.clone(),
                remote_port: handle.request.remote_port,
                proxy_connection_id: handle.request.proxy_connection_id.clone(),
                bytes_sent: handle.bytes_sent.load(Ordering::Relaxed),
                bytes_received: handle.bytes_received.load(Ordering::Relaxed),
                closed: handle.closed.load(Ordering::Relaxed),
            })
            .collect()
    }
}
