//! Domain types for onion service requests and records.

use serde::{Deserialize, Serialize};

/// Closed set of service-type tags a hidden service can front, modeled
/// on the reference implementation's service registry beyond the bare
/// "service type tag" the distilled contract leaves abstract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnionServiceType {
    Rdp,
    Wallet,
    ApiGateway,
    Tunnel,
    MongoProxy,
    TorControl,
}

/// How the service's Ed25519-v3 key should be sourced.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// Generate a fresh key pair.
    Generate,
    /// Caller-supplied 32-byte Ed25519 seed.
    Raw(Vec<u8>),
}

/// A request to create a new onion service.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub service_type: OnionServiceType,
    /// Logical name used for non-ephemeral conflict detection. Ephemeral
    /// services never conflict regardless of name.
    pub name: Option<String>,
    pub onion_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub key: KeyMaterial,
    pub ephemeral: bool,
}

/// A durable record of one onion service, persisted in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnionServiceRecord {
    pub service_id: String,
    pub service_type: OnionServiceType,
    pub name: Option<String>,
    pub onion_address: String,
    pub onion_port: u16,
    pub target_host: String,
    pub target_port: u16,
    /// Path to the private key file, never the key bytes themselves.
    pub key_path: String,
    pub ephemeral: bool,
    pub created_at: u64,
    pub removed: bool,
}

/// Returned by `rotate`: the old address for audit logging, and the
/// record installed in its place.
#[derive(Debug, Clone)]
pub struct RotationResult {
    pub old_onion_address: String,
    pub record: OnionServiceRecord,
}
