//! # Core Domain Entities
//!
//! The domain model for the Lucid session-processing and anchoring
//! pipeline: sessions and their chunks, the Merkle descriptor and
//! blockchain anchor attached to a finished session, blocks and
//! transactions on the anchoring chain, onion service records, payment
//! requests, and per-session policy.
//!
//! ## Clusters
//!
//! - **Session**: Session, Chunk, `MerkleTreeDescriptor`, `BlockchainAnchor`
//! - **Chain**: Block, `BlockHeader`, Transaction, `ConsensusRecord`
//! - **Networking**: `OnionServiceRecord`
//! - **Payments**: `PaymentRequest`
//! - **Policy**: Policy, `CapabilityWhitelist`, `PrivacyShieldConfig`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::time::{SystemTime, UNIX_EPOCH};

/// A 32-byte content-addressed digest (BLAKE3 or SHA-256 depending on
/// the owning session's declared hash algorithm).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Unique identifier for a session. Assigned at RDP handshake completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Generates a new random session id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the current Unix timestamp in seconds. Never panics: a clock
/// before the epoch (which should not happen on any sane host) yields 0.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// CLUSTER A: SESSION
// =============================================================================

/// Session lifecycle state. See spec.md §4.4 for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Pending,
    Ready,
    Recording,
    Finalizing,
    Anchoring,
    Completed,
    Failed,
    Cancelled,
}

/// An append-only audit event recorded by the Pipeline Coordinator, the
/// sole mutator of session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: u64,
    pub kind: String,
    pub detail: String,
}

impl AuditEvent {
    pub fn new(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: now_unix(),
            kind: kind.into(),
            detail: detail.into(),
        }
    }
}

/// Chunk lifecycle state. Chunks are append-only once `Stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkState {
    Pending,
    Uploaded,
    Encrypted,
    Stored,
    Failed,
}

/// An immutable record of one chunk inside a session.
///
/// Invariant: indices are dense starting at 0, and `ciphertext_hash`
/// appears at this chunk's leaf position in the session's Merkle tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: u64,
    pub original_size: u64,
    pub ciphertext_size: u64,
    pub ciphertext_hash: Hash,
    pub compression_algorithm: String,
    pub encryption_algorithm: String,
    pub storage_locator: String,
    pub state: ChunkState,
}

/// Hash algorithm tag a session's Merkle tree was built under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Blake3,
    Sha256,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Blake3
    }
}

/// Attached to a Session once the Merkle builder finalizes.
///
/// Invariant: `root` equals the deterministic pairwise reduction of the
/// session's chunk ciphertext hashes, in index order, under `algorithm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTreeDescriptor {
    pub root: Hash,
    pub leaf_count: u64,
    pub height: u32,
    pub build_timestamp: u64,
    pub algorithm: HashAlgorithm,
}

/// Attached to a Session once on-chain confirmation reaches the
/// required threshold.
///
/// Invariant: `merkle_root == session.merkle_tree.root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainAnchor {
    pub block_height: u64,
    pub block_id: Hash,
    pub transaction_id: Hash,
    pub merkle_root: Hash,
    pub anchored_at: u64,
    pub confirmation_count: u32,
    pub verified: bool,
}

/// The primary aggregate: one end-to-end recording instance from RDP
/// handshake to anchor. Exclusively owned and mutated by the Pipeline
/// Coordinator for the duration of its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub owner_address: Option<String>,
    pub policy_hash: Hash,
    pub state: SessionState,
    pub connected_at: u64,
    pub ended_at: Option<u64>,
    pub bytes_captured: u64,
    pub recorded_size: u64,
    pub chunks: Vec<Chunk>,
    pub merkle_tree: Option<MerkleTreeDescriptor>,
    pub anchor: Option<BlockchainAnchor>,
    pub audit_log: Vec<AuditEvent>,
}

impl Session {
    pub fn new(id: SessionId, policy_hash: Hash) -> Self {
        Self {
            id,
            owner_address: None,
            policy_hash,
            state: SessionState::Pending,
            connected_at: now_unix(),
            ended_at: None,
            bytes_captured: 0,
            recorded_size: 0,
            chunks: Vec::new(),
            merkle_tree: None,
            anchor: None,
            audit_log: vec![AuditEvent::new("created", "session created")],
        }
    }

    /// Chunk indices must be dense starting at 0, per spec.md §3.
    pub fn next_chunk_index(&self) -> u64 {
        self.chunks.len() as u64
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Status of a proposed or confirmed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Pending,
    Confirmed,
    Finalized,
    Orphaned,
}

/// Type tag for a transaction on the anchoring chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    SessionAnchor,
    StateUpdate,
    Governance,
}

/// Lifecycle status of a transaction from submission to inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Included,
    Confirmed,
    Rejected,
}

/// Payload carried by a session-anchor transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnchorPayload {
    pub session_id: SessionId,
    pub owner: String,
    pub merkle_root: Hash,
    pub chunk_count: u64,
    pub total_size_bytes: u64,
    pub manifest_hash: Hash,
}

/// Either a session-anchor, a state-update, or a governance record.
///
/// Invariant: `id` is a pure function of `(tx_type, payload, signature)`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Hash,
    pub tx_type: TransactionType,
    pub payload: Vec<u8>,
    pub submitted_at: u64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub block_hash: Option<Hash>,
    pub confirmation_count: u32,
    pub status: TransactionStatus,
}

/// Header fields that determine a block's deterministic id (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u16,
    pub height: u64,
    pub previous_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u64,
    pub nonce: u64,
}

/// A single validator vote in a PoOT consensus round.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub node_id: PublicKey,
    pub block_hash: Hash,
    pub approve: bool,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub timestamp: u64,
}

/// The consensus record attached to a block once it reaches quorum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub votes: Vec<Vote>,
    pub total_stake_voted: u128,
    pub quorum_stake: u128,
}

/// Ordered container of transactions anchored on the Lucid chain.
///
/// Invariants (spec.md §3): height 0 has `previous_hash` all-zeros;
/// height N>0 has `previous_hash == block[N-1].id`; `id` is deterministic
/// over the header; finalized blocks never become orphaned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: Hash,
    pub header: BlockHeader,
    pub status: BlockStatus,
    pub transactions: Vec<Transaction>,
    pub session_anchor_ids: Vec<Hash>,
    pub consensus: Option<ConsensusRecord>,
    pub size_bytes: u64,
    pub confirmation_count: u32,
}

impl Block {
    /// 32 zero bytes: genesis's previous-hash value.
    pub const ZERO_HASH: Hash = [0u8; 32];
}

// =============================================================================
// CLUSTER C: NETWORKING (TOR)
// =============================================================================

/// Onion service type tag (spec.md §4.1; extended per original source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnionServiceType {
    Rdp,
    Tunnel,
    ApiGateway,
    Control,
}

/// Onion service private-key type. Ed25519-v3 is the only supported
/// production key type (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnionKeyType {
    New,
    Ed25519V3,
    RawPrivateKey,
}

/// Lifecycle status of an onion service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnionServiceStatus {
    Creating,
    Active,
    Removed,
    Failed,
}

/// Attributes of a managed onion service (spec.md §3).
///
/// Invariant: an `Active` record has a non-empty onion address and an
/// installed port mapping in the running Tor process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnionServiceRecord {
    pub service_id: String,
    pub service_type: OnionServiceType,
    pub onion_address: Option<String>,
    pub onion_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub key_type: OnionKeyType,
    pub key_path: Option<String>,
    pub status: OnionServiceStatus,
    pub created_at: u64,
    pub ephemeral: bool,
}

// =============================================================================
// CLUSTER D: PAYMENTS
// =============================================================================

/// Type of paid service a payment request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    Session,
    Storage,
    Bandwidth,
    Registration,
    Governance,
    Custom,
    Donation,
}

/// Payment method / settlement rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    UsdtTrc20,
    Trx,
    MultiToken,
}

/// Processing priority. Supplemented from the original source beyond
/// spec.md's binary implication (see SPEC_FULL.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaymentPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for PaymentPriority {
    fn default() -> Self {
        PaymentPriority::Normal
    }
}

/// Lifecycle status of a payment request (spec.md §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Received,
    Validated,
    ManualReview,
    Processed,
    Confirmed,
    Rejected,
    Expired,
    Failed,
}

/// What a payment is linked to, if anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentLinkage {
    Session(SessionId),
    Node(String),
    Service(String),
    Reference(String),
    None,
}

/// A request for payment gating session/storage/bandwidth activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payment_id: uuid::Uuid,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub amount: f64,
    pub token_type: String,
    pub recipient_address: String,
    pub sender_address: Option<String>,
    pub linkage: PaymentLinkage,
    pub priority: PaymentPriority,
    pub expires_at: Option<u64>,
    pub status: PaymentStatus,
    pub created_at: u64,
    pub confirmation_count: u32,
    pub confirmed_at: Option<u64>,
    pub observed_txid: Option<String>,
}

// =============================================================================
// CLUSTER E: POLICY
// =============================================================================

/// File-transfer capability, optionally scoped to path prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTransferCapability {
    pub allowed: bool,
    pub path_prefixes: Vec<String>,
}

/// Per-session capability whitelist (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityWhitelist {
    pub input: bool,
    pub clipboard: bool,
    pub file_transfer: FileTransferCapability,
    pub application_allow_list: Vec<String>,
}

/// An opaque rectangular redaction zone applied to bitmap-update PDUs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionZone {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Privacy-shield configuration (spec.md §3, §4.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivacyShieldConfig {
    pub zones: Vec<RedactionZone>,
}

/// Per-session policy. Immutable for the duration of a session.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub default_deny: bool,
    pub capabilities: CapabilityWhitelist,
    pub privacy_shield: PrivacyShieldConfig,
    pub policy_hash: Hash,
    #[serde_as(as = "Bytes")]
    pub owner_signature: Signature,
    pub version: u32,
    pub created_by: PublicKey,
    pub free_session: bool,
}
