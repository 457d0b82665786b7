//! Prometheus metrics for Lucid components.
//!
//! All metrics follow the naming convention: `lucid_<domain>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., sessions_started_total)
//! - **Gauge**: Value that can go up or down (e.g., chunks_pending)
//! - **Histogram**: Distribution of values (e.g., chunk_encode_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS (lucid-08-session-pipeline)
    // =========================================================================

    /// Total sessions started
    pub static ref SESSIONS_STARTED: Counter = Counter::new(
        "lucid_session_sessions_started_total",
        "Total number of remote-desktop sessions started"
    ).expect("metric creation failed");

    /// Total sessions completed, by terminal state
    pub static ref SESSIONS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("lucid_session_sessions_completed_total", "Sessions reaching a terminal state"),
        &["outcome"]  // outcome: anchored/aborted/failed
    ).expect("metric creation failed");

    /// Currently active sessions
    pub static ref SESSIONS_ACTIVE: Gauge = Gauge::new(
        "lucid_session_sessions_active",
        "Number of sessions currently recording"
    ).expect("metric creation failed");

    // =========================================================================
    // CHUNK PIPELINE METRICS (lucid-04/05/06-chunk-assembler/compression/encryption)
    // =========================================================================

    /// Total chunks assembled from raw capture frames
    pub static ref CHUNKS_ASSEMBLED: Counter = Counter::new(
        "lucid_chunk_chunks_assembled_total",
        "Total chunks assembled from capture frames"
    ).expect("metric creation failed");

    /// Chunk compression duration
    pub static ref CHUNK_COMPRESSION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_chunk_compression_duration_seconds",
            "Time spent compressing a chunk"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    /// Chunk encryption duration
    pub static ref CHUNK_ENCRYPTION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_chunk_encryption_duration_seconds",
            "Time spent encrypting a chunk"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap())
    ).expect("metric creation failed");

    /// Compression ratio achieved (compressed_bytes / raw_bytes)
    pub static ref CHUNK_COMPRESSION_RATIO: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_chunk_compression_ratio",
            "Ratio of compressed size to raw size"
        ).buckets(vec![0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])
    ).expect("metric creation failed");

    /// Chunks currently awaiting anchoring
    pub static ref CHUNKS_PENDING_ANCHOR: Gauge = Gauge::new(
        "lucid_chunk_chunks_pending_anchor",
        "Chunks sealed but not yet anchored on-chain"
    ).expect("metric creation failed");

    // =========================================================================
    // MERKLE / ANCHORING METRICS (lucid-07-merkle, lucid-13-anchoring)
    // =========================================================================

    /// Total Merkle trees built for completed sessions
    pub static ref MERKLE_TREES_BUILT: Counter = Counter::new(
        "lucid_merkle_trees_built_total",
        "Total Merkle trees built over session chunk hashes"
    ).expect("metric creation failed");

    /// Merkle proof verification outcomes
    pub static ref MERKLE_PROOFS_VERIFIED: CounterVec = CounterVec::new(
        Opts::new("lucid_merkle_proofs_verified_total", "Merkle inclusion proof verifications"),
        &["result"]  // result: valid/invalid
    ).expect("metric creation failed");

    /// Total anchor transactions submitted to the chain
    pub static ref ANCHORS_SUBMITTED: Counter = Counter::new(
        "lucid_anchor_anchors_submitted_total",
        "Total session-root anchor transactions submitted"
    ).expect("metric creation failed");

    /// Anchor confirmation latency
    pub static ref ANCHOR_CONFIRMATION_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_anchor_confirmation_latency_seconds",
            "Time from anchor submission to on-chain confirmation"
        ).buckets(exponential_buckets(1.0, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCK / CONSENSUS METRICS (lucid-14-block-service, lucid-15-consensus)
    // =========================================================================

    /// Total blocks stored
    pub static ref BLOCKS_STORED: Counter = Counter::new(
        "lucid_chain_blocks_stored_total",
        "Total number of blocks written to storage"
    ).expect("metric creation failed");

    /// Current chain height
    pub static ref CHAIN_HEIGHT: Gauge = Gauge::new(
        "lucid_chain_height",
        "Current blockchain height"
    ).expect("metric creation failed");

    /// Proof-of-Observation-Time consensus rounds
    pub static ref CONSENSUS_ROUNDS: CounterVec = CounterVec::new(
        Opts::new("lucid_consensus_rounds_total", "Total PoOT consensus rounds"),
        &["outcome"]  // outcome: finalized/timeout/tie_break
    ).expect("metric creation failed");

    /// Validator vote mass observed per round
    pub static ref CONSENSUS_VOTE_MASS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_consensus_vote_mass",
            "Cumulative stake-weighted vote mass per consensus round"
        ).buckets(exponential_buckets(1.0, 2.0, 16).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // PAYMENT METRICS (lucid-10/11/12-payment-acceptor/processor/validator)
    // =========================================================================

    /// Payment requests created
    pub static ref PAYMENTS_CREATED: Counter = Counter::new(
        "lucid_payment_requests_created_total",
        "Total payment requests created"
    ).expect("metric creation failed");

    /// Payment state transitions
    pub static ref PAYMENT_STATE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("lucid_payment_state_transitions_total", "Payment status transitions"),
        &["from", "to"]
    ).expect("metric creation failed");

    /// Payments currently awaiting manual review
    pub static ref PAYMENTS_PENDING_REVIEW: Gauge = Gauge::new(
        "lucid_payment_pending_review",
        "Payments currently in MANUAL_REVIEW"
    ).expect("metric creation failed");

    /// Settlement retry attempts
    pub static ref PAYMENT_SETTLEMENT_RETRIES: Counter = Counter::new(
        "lucid_payment_settlement_retries_total",
        "Total settlement retry attempts after timeout"
    ).expect("metric creation failed");

    // =========================================================================
    // NETWORKING METRICS (lucid-01-onion-service, lucid-02-socks-proxy)
    // =========================================================================

    /// Onion services currently published
    pub static ref ONION_SERVICES_ACTIVE: Gauge = Gauge::new(
        "lucid_network_onion_services_active",
        "Number of onion services currently published"
    ).expect("metric creation failed");

    /// SOCKS proxy connections accepted
    pub static ref SOCKS_CONNECTIONS_ACCEPTED: Counter = Counter::new(
        "lucid_network_socks_connections_accepted_total",
        "Total SOCKS5 connections accepted by the proxy"
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNATURE METRICS
    // =========================================================================

    /// Total signature verifications
    pub static ref SIGNATURE_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("lucid_signature_verifications_total", "Total signature verifications"),
        &["result"]  // result: valid/invalid
    ).expect("metric creation failed");

    /// Signature verification duration
    pub static ref SIGNATURE_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "lucid_signature_verification_duration_seconds",
            "Time spent verifying signatures"
        ).buckets(exponential_buckets(0.00001, 2.0, 15).unwrap()),
        &["mode"]  // mode: single/batch
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Messages published to the event bus
    pub static ref EVENT_BUS_MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("lucid_eventbus_messages_sent_total", "Messages published to the event bus"),
        &["topic", "source_component"]
    ).expect("metric creation failed");

    /// Messages delivered from the event bus
    pub static ref EVENT_BUS_MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("lucid_eventbus_messages_received_total", "Messages delivered to subscribers"),
        &["topic"]
    ).expect("metric creation failed");

    /// Event bus delivery latency
    pub static ref EVENT_BUS_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lucid_eventbus_delivery_latency_seconds",
            "Time for event delivery via bus"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Component errors by type
    pub static ref COMPONENT_ERRORS: CounterVec = CounterVec::new(
        Opts::new("lucid_component_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics server
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Sessions
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSIONS_COMPLETED.clone()),
        Box::new(SESSIONS_ACTIVE.clone()),
        // Chunk pipeline
        Box::new(CHUNKS_ASSEMBLED.clone()),
        Box::new(CHUNK_COMPRESSION_DURATION.clone()),
        Box::new(CHUNK_ENCRYPTION_DURATION.clone()),
        Box::new(CHUNK_COMPRESSION_RATIO.clone()),
        Box::new(CHUNKS_PENDING_ANCHOR.clone()),
        // Merkle / anchoring
        Box::new(MERKLE_TREES_BUILT.clone()),
        Box::new(MERKLE_PROOFS_VERIFIED.clone()),
        Box::new(ANCHORS_SUBMITTED.clone()),
        Box::new(ANCHOR_CONFIRMATION_LATENCY.clone()),
        // Block / consensus
        Box::new(BLOCKS_STORED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(CONSENSUS_ROUNDS.clone()),
        Box::new(CONSENSUS_VOTE_MASS.clone()),
        // Payments
        Box::new(PAYMENTS_CREATED.clone()),
        Box::new(PAYMENT_STATE_TRANSITIONS.clone()),
        Box::new(PAYMENTS_PENDING_REVIEW.clone()),
        Box::new(PAYMENT_SETTLEMENT_RETRIES.clone()),
        // Networking
        Box::new(ONION_SERVICES_ACTIVE.clone()),
        Box::new(SOCKS_CONNECTIONS_ACCEPTED.clone()),
        // Signatures
        Box::new(SIGNATURE_VERIFICATIONS.clone()),
        Box::new(SIGNATURE_DURATION.clone()),
        // Event Bus
        Box::new(EVENT_BUS_MESSAGES_SENT.clone()),
        Box::new(EVENT_BUS_MESSAGES_RECEIVED.clone()),
        Box::new(EVENT_BUS_LATENCY.clone()),
        // Errors
        Box::new(COMPONENT_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
