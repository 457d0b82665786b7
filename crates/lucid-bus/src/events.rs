//! # Lucid Events
//!
//! Every event type that flows through the bus. Components never call
//! each other directly; they publish events here and subscribe to the
//! topics they care about.

use lucid_types::{
    BlockStatus, Hash, OnionServiceStatus, PaymentStatus, SessionId, SessionState,
};
use serde::{Deserialize, Serialize};

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LucidEvent {
    // =========================================================================
    // CAPTURE / RDP HANDLER
    // =========================================================================
    /// An RDP session handshake completed and a session was created.
    SessionStarted { session_id: SessionId },

    /// A session transitioned state (tracked for audit and dashboards).
    SessionStateChanged {
        session_id: SessionId,
        from: SessionState,
        to: SessionState,
    },

    /// The RDP handler tore down a session's transport connection.
    SessionEnded { session_id: SessionId, bytes_captured: u64 },

    // =========================================================================
    // CHUNK ASSEMBLER / COMPRESSION / ENCRYPTION
    // =========================================================================
    /// Raw capture bytes crossed the chunk boundary and are ready to compress.
    ChunkBoundaryReached { session_id: SessionId, chunk_index: u64, raw_size: u64 },

    /// A chunk finished compression and is ready for encryption.
    ChunkCompressed {
        session_id: SessionId,
        chunk_index: u64,
        compressed_size: u64,
        algorithm: String,
    },

    /// A chunk finished encryption and is ready for storage.
    ChunkEncrypted {
        session_id: SessionId,
        chunk_index: u64,
        ciphertext_hash: Hash,
        algorithm: String,
    },

    /// A chunk was durably written to storage.
    ChunkStored { session_id: SessionId, chunk_index: u64, storage_locator: String },

    // =========================================================================
    // MERKLE / ANCHORING
    // =========================================================================
    /// The session ended and its Merkle tree was finalized.
    MerkleTreeFinalized { session_id: SessionId, root: Hash, leaf_count: u64 },

    /// A session-anchor transaction was submitted to the chain.
    AnchorSubmitted { session_id: SessionId, transaction_id: Hash },

    /// A session's anchor transaction reached the confirmation threshold.
    AnchorConfirmed { session_id: SessionId, block_height: u64, confirmation_count: u32 },

    // =========================================================================
    // CONSENSUS / BLOCK SERVICE
    // =========================================================================
    /// A block was proposed and is open for voting.
    BlockProposed { block_id: Hash, height: u64, proposer: [u8; 32] },

    /// This node cast a vote in a consensus round.
    VoteCast { block_id: Hash, approve: bool },

    /// A block reached quorum and its status changed.
    BlockStatusChanged { block_id: Hash, height: u64, status: BlockStatus },

    // =========================================================================
    // PAYMENTS
    // =========================================================================
    /// A payment's on-chain transaction was first observed.
    PaymentObserved { payment_id: uuid::Uuid, txid: String },

    /// A payment transitioned state in the acceptance/processing pipeline.
    PaymentStatusChanged {
        payment_id: uuid::Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A payment was confirmed, releasing whatever it was gating.
    PaymentConfirmed { payment_id: uuid::Uuid, linked_session: Option<SessionId> },

    // =========================================================================
    // ONION SERVICES
    // =========================================================================
    /// An onion service's lifecycle status changed.
    OnionServiceStatusChanged { service_id: String, status: OnionServiceStatus },

    // =========================================================================
    // CRITICAL EVENTS (DEAD LETTER QUEUE)
    // =========================================================================
    /// A component hit an unrecoverable error requiring operator attention.
    CriticalError { component: String, error: String },

    // =========================================================================
    // CONTROL-PLANE QUERIES
    // =========================================================================
    /// Query issued by an external control surface (CLI/RPC) to a component.
    ControlQuery {
        correlation_id: String,
        target: String,
        method: String,
        params: serde_json::Value,
    },

    /// Response to a `ControlQuery`.
    ControlQueryResponse {
        correlation_id: String,
        source: String,
        result: Result<serde_json::Value, ControlQueryError>,
    },
}

/// Error payload for a failed `ControlQuery`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlQueryError {
    pub code: i32,
    pub message: String,
}

impl LucidEvent {
    /// Topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SessionStarted { .. }
            | Self::SessionStateChanged { .. }
            | Self::SessionEnded { .. } => EventTopic::SessionPipeline,
            Self::ChunkBoundaryReached { .. }
            | Self::ChunkCompressed { .. }
            | Self::ChunkEncrypted { .. }
            | Self::ChunkStored { .. } => EventTopic::ChunkPipeline,
            Self::MerkleTreeFinalized { .. }
            | Self::AnchorSubmitted { .. }
            | Self::AnchorConfirmed { .. } => EventTopic::Anchoring,
            Self::BlockProposed { .. }
            | Self::VoteCast { .. }
            | Self::BlockStatusChanged { .. } => EventTopic::Consensus,
            Self::PaymentObserved { .. }
            | Self::PaymentStatusChanged { .. }
            | Self::PaymentConfirmed { .. } => EventTopic::Payments,
            Self::OnionServiceStatusChanged { .. } => EventTopic::Networking,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
            Self::ControlQuery { .. } | Self::ControlQueryResponse { .. } => EventTopic::Control,
        }
    }

    /// Component name that originated the event. `None` when the event's
    /// source is carried in the payload itself (e.g. `CriticalError`).
    #[must_use]
    pub fn source_component(&self) -> Option<&str> {
        match self {
            Self::CriticalError { component, .. } => Some(component.as_str()),
            Self::ControlQueryResponse { source, .. } => Some(source.as_str()),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    SessionPipeline,
    ChunkPipeline,
    Anchoring,
    Consensus,
    Payments,
    Networking,
    DeadLetterQueue,
    Control,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    #[must_use]
    pub fn matches(&self, event: &LucidEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session_event() -> LucidEvent {
        LucidEvent::SessionStarted {
            session_id: SessionId::new(),
        }
    }

    #[test]
    fn topic_mapping_is_stable() {
        assert_eq!(sample_session_event().topic(), EventTopic::SessionPipeline);
        assert_eq!(
            LucidEvent::CriticalError {
                component: "lucid-10-payment-acceptor".into(),
                error: "db unreachable".into(),
            }
            .topic(),
            EventTopic::DeadLetterQueue
        );
    }

    #[test]
    fn filter_all_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&sample_session_event()));
    }

    #[test]
    fn filter_by_topic_excludes_others() {
        let filter = EventFilter::topics(vec![EventTopic::Payments]);
        assert!(!filter.matches(&sample_session_event()));
        assert!(filter.matches(&LucidEvent::PaymentConfirmed {
            payment_id: uuid::Uuid::new_v4(),
            linked_session: None,
        }));
    }
}
