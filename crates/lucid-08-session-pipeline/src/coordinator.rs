//! The Session Pipeline Coordinator: single owner and sole mutator of
//! every session's state (spec.md §4.4).
//!
//! Sessions live in an append-only arena keyed by [`SessionId`]; only
//! the coordinator ever resolves an id to a mutable handle (spec.md §9
//! "Cyclic relationships" strategy). Every other component reports
//! events upward through [`lucid_bus`] rather than calling back in.

use crate::errors::PipelineError;
use crate::ports::{AnchorPort, ChunkStore};
use crate::state::is_legal_transition;
use lucid_04_chunk_assembler::AssembledChunk;
use lucid_05_compression::{Algorithm as CompressionAlgorithm, Compressor};
use lucid_06_encryption::Encryptor;
use lucid_07_merkle::MerkleBuilder;
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_crypto::Cipher;
use lucid_types::{
    now_unix, AuditEvent, BlockchainAnchor, Chunk, ChunkState, HashAlgorithm, Policy, Session,
    SessionId, SessionManifest, SessionState,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, Semaphore};

/// Runtime-only state that rides alongside a [`Session`] for as long as
/// the coordinator owns it. Never exposed outside this crate; callers
/// only ever see [`Session`] snapshots.
struct SessionRuntime {
    session: Session,
    policy: Policy,
    merkle: Option<MerkleBuilder>,
    stall_since: Option<u64>,
    stall_seconds_total: u64,
}

/// Tunable pipeline parameters. Defaults mirror spec.md §4.3/§4.6/§6.
pub struct PipelineConfig {
    pub compression_algorithm: CompressionAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    /// Capacity of the queue feeding the durable chunk store. Exceeding
    /// it pauses capture intake rather than dropping data (spec.md §4.4).
    pub chunk_store_queue_capacity: usize,
    /// How long ANCHORING may wait for confirmation before the session
    /// fails with a partial-completion record (spec.md §4.4).
    pub anchor_timeout: std::time::Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compression_algorithm: CompressionAlgorithm::Zstd,
            hash_algorithm: HashAlgorithm::Blake3,
            chunk_store_queue_capacity: 64,
            anchor_timeout: std::time::Duration::from_secs(300),
        }
    }
}

/// The coordinator. One instance serves every session on a node.
pub struct PipelineCoordinator {
    sessions: RwLock<HashMap<SessionId, SessionRuntime>>,
    bus: Arc<dyn EventPublisher>,
    compressor: Compressor,
    encryptor: Mutex<Encryptor>,
    chunk_store: Arc<dyn ChunkStore>,
    anchor: Arc<dyn AnchorPort>,
    store_queue: Semaphore,
    config: PipelineConfig,
}

impl PipelineCoordinator {
    pub fn new(
        bus: Arc<dyn EventPublisher>,
        compressor: Compressor,
        cipher: Cipher,
        chunk_store: Arc<dyn ChunkStore>,
        anchor: Arc<dyn AnchorPort>,
        config: PipelineConfig,
    ) -> Result<Self, lucid_06_encryption::EncryptionError> {
        let encryptor = Encryptor::with_default_rotation(cipher)?;
        let capacity = config.chunk_store_queue_capacity;
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            bus,
            compressor,
            encryptor: Mutex::new(encryptor),
            chunk_store,
            anchor,
            store_queue: Semaphore::new(capacity),
            config,
        })
    }

    async fn publish(&self, event: LucidEvent) {
        self.bus.publish(event).await;
    }

    /// Creates a new session in `PENDING` (or immediately `READY` if
    /// `policy.free_session` skips payment gating).
    pub async fn create_session(&self, policy: Policy) -> SessionId {
        let id = SessionId::new();
        let mut session = Session::new(id, policy.policy_hash);
        if policy.free_session {
            session.state = SessionState::Ready;
            session
                .audit_log
                .push(AuditEvent::new("free_session", "payment gate skipped by policy"));
        }

        self.sessions.write().await.insert(
            id,
            SessionRuntime {
                session,
                policy,
                merkle: Some(MerkleBuilder::new(self.config.hash_algorithm)),
                stall_since: None,
                stall_seconds_total: 0,
            },
        );
        id
    }

    async fn with_session<F, R>(&self, id: SessionId, f: F) -> Result<R, PipelineError>
    where
        F: FnOnce(&mut SessionRuntime) -> Result<R, PipelineError>,
    {
        let mut sessions = self.sessions.write().await;
        let runtime = sessions.get_mut(&id).ok_or(PipelineError::SessionNotFound(id))?;
        f(runtime)
    }

    fn transition(
        runtime: &mut SessionRuntime,
        to: SessionState,
        action: &str,
    ) -> Result<SessionState, PipelineError> {
        let from = runtime.session.state;
        if !is_legal_transition(from, to) {
            return Err(PipelineError::InvalidTransition {
                session: runtime.session.id,
                from,
                action: action.to_string(),
            });
        }
        runtime.session.state = to;
        runtime.session.audit_log.push(AuditEvent::new(
            "state_changed",
            format!("{from:?} -> {to:?} ({action})"),
        ));
        Ok(from)
    }

    /// `PENDING -> READY`. The Payment Acceptor calls this once a
    /// matching payment request reaches `CONFIRMED`.
    pub async fn note_payment_confirmed(&self, id: SessionId) -> Result<(), PipelineError> {
        let from = self
            .with_session(id, |r| Self::transition(r, SessionState::Ready, "payment_confirmed"))
            .await?;
        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Ready,
        })
        .await;
        Ok(())
    }

    /// `READY -> RECORDING`. Called once the RDP handler completes its
    /// handshake and verifies the owner's signature.
    pub async fn rdp_handshake_ok(
        &self,
        id: SessionId,
        owner_address: String,
    ) -> Result<(), PipelineError> {
        let from = self
            .with_session(id, |r| {
                let from = Self::transition(r, SessionState::Recording, "rdp_handshake_ok")?;
                r.session.owner_address = Some(owner_address);
                Ok(from)
            })
            .await?;
        self.publish(LucidEvent::SessionStarted { session_id: id }).await;
        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Recording,
        })
        .await;
        Ok(())
    }

    /// Records a policy violation observed by the RDP handler. Critical
    /// kinds (`policy-mismatch`, `unauthorized-action`) are
    /// session-fatal; the rest are logged and the offending PDU is
    /// already dropped by the caller.
    pub async fn record_policy_violation(
        &self,
        id: SessionId,
        kind: &str,
        detail: &str,
        critical: bool,
    ) -> Result<(), PipelineError> {
        if critical {
            return self.fail(id, kind, detail).await;
        }
        self.with_session(id, |r| {
            r.session
                .audit_log
                .push(AuditEvent::new(format!("policy_violation:{kind}"), detail));
            Ok(())
        })
        .await
    }

    /// Runs one assembled chunk through compress -> encrypt -> Merkle
    /// append -> durable store, in strict emission order. Blocks on the
    /// store-queue semaphore rather than dropping data when the
    /// durable-storage leg saturates; the wait is recorded as a stall.
    pub async fn ingest_chunk(
        &self,
        id: SessionId,
        chunk: AssembledChunk,
    ) -> Result<(), PipelineError> {
        {
            let sessions = self.sessions.read().await;
            let runtime = sessions.get(&id).ok_or(PipelineError::SessionNotFound(id))?;
            if runtime.session.state != SessionState::Recording {
                return Err(PipelineError::InvalidTransition {
                    session: id,
                    from: runtime.session.state,
                    action: "ingest_chunk".to_string(),
                });
            }
            let expected = runtime.session.next_chunk_index();
            if chunk.index != expected {
                return Err(PipelineError::ChunkIndexGap {
                    session: id,
                    expected,
                    got: chunk.index,
                });
            }
        }

        let original_size = chunk.bytes.len() as u64;
        let compressed = self
            .compressor
            .compress(self.config.compression_algorithm, &chunk.bytes)
            .await?;
        self.publish(LucidEvent::ChunkCompressed {
            session_id: id,
            chunk_index: chunk.index,
            compressed_size: compressed.len() as u64,
            algorithm: self.config.compression_algorithm.tag().to_string(),
        })
        .await;

        let packet = {
            let mut encryptor = self.encryptor.lock().await;
            encryptor.encrypt(&id.to_string(), &compressed, None)?
        };
        let ciphertext = packet.ciphertext_bytes()?;
        let ciphertext_hash = lucid_crypto::blake3_hash(&ciphertext);
        self.publish(LucidEvent::ChunkEncrypted {
            session_id: id,
            chunk_index: chunk.index,
            ciphertext_hash,
            algorithm: packet.algorithm.clone(),
        })
        .await;

        let permit = {
            let started_waiting = self.store_queue.available_permits() == 0;
            if started_waiting {
                self.with_session(id, |r| {
                    r.stall_since = Some(now_unix());
                    Ok(())
                })
                .await?;
            }
            self.store_queue
                .acquire()
                .await
                .expect("semaphore is never closed")
        };
        let locator = self
            .chunk_store
            .store(id, chunk.index, &ciphertext)
            .await
            .map_err(PipelineError::Store)?;
        drop(permit);

        self.with_session(id, |r| {
            if let Some(since) = r.stall_since.take() {
                r.stall_seconds_total += now_unix().saturating_sub(since);
            }
            r.merkle
                .as_mut()
                .expect("merkle builder present while recording")
                .append(ciphertext_hash);
            r.session.chunks.push(Chunk {
                index: chunk.index,
                original_size,
                ciphertext_size: ciphertext.len() as u64,
                ciphertext_hash,
                compression_algorithm: self.config.compression_algorithm.tag().to_string(),
                encryption_algorithm: packet.algorithm.clone(),
                storage_locator: locator.clone(),
                state: ChunkState::Stored,
            });
            r.session.bytes_captured += original_size;
            r.session.recorded_size += ciphertext.len() as u64;
            Ok(())
        })
        .await?;

        self.publish(LucidEvent::ChunkStored {
            session_id: id,
            chunk_index: chunk.index,
            storage_locator: locator,
        })
        .await;
        Ok(())
    }

    /// `RECORDING -> FINALIZING -> ANCHORING`: flushes the Merkle tree,
    /// builds the manifest, and submits it to the Anchoring Service.
    /// Returns the submitted manifest.
    pub async fn capture_eof(&self, id: SessionId) -> Result<SessionManifest, PipelineError> {
        let (manifest, from) = self
            .with_session(id, |r| {
                let from = Self::transition(r, SessionState::Finalizing, "capture_eof")?;
                let builder = r.merkle.take().expect("merkle builder present once per session");
                let tree = builder.finalize(now_unix())?;
                r.session.merkle_tree = Some(tree.descriptor());
                Self::transition(r, SessionState::Anchoring, "merkle_built")?;

                let chunk_hashes = r.session.chunks.iter().map(|c| c.ciphertext_hash).collect();
                let manifest = SessionManifest {
                    session_id: id,
                    user_id: r.session.owner_address.clone().unwrap_or_default(),
                    created_at: now_unix(),
                    total_chunks: tree.leaf_count(),
                    total_size_bytes: r.session.recorded_size,
                    merkle_root: tree.root(),
                    chunk_hashes,
                    metadata: serde_json::json!({}),
                    signature: None,
                };
                Ok((manifest, from))
            })
            .await?;

        self.publish(LucidEvent::MerkleTreeFinalized {
            session_id: id,
            root: manifest.merkle_root,
            leaf_count: manifest.total_chunks,
        })
        .await;
        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Anchoring,
        })
        .await;

        let txid = self.anchor.submit_manifest(manifest.clone()).await;
        self.publish(LucidEvent::AnchorSubmitted {
            session_id: id,
            transaction_id: txid,
        })
        .await;
        Ok(manifest)
    }

    /// `ANCHORING -> COMPLETED`, invoked once the Anchoring Service
    /// reports the required confirmation depth.
    pub async fn anchor_confirmed(
        &self,
        id: SessionId,
        anchor: BlockchainAnchor,
    ) -> Result<(), PipelineError> {
        self.with_session(id, |r| {
            Self::transition(r, SessionState::Completed, "anchor_confirmed")?;
            r.session.anchor = Some(anchor.clone());
            r.session.ended_at = Some(now_unix());
            Ok(())
        })
        .await?;
        self.publish(LucidEvent::AnchorConfirmed {
            session_id: id,
            block_height: anchor.block_height,
            confirmation_count: anchor.confirmation_count,
        })
        .await;
        Ok(())
    }

    /// Anchoring exceeded `anchor_timeout` without confirmation: fails
    /// the session but keeps the Merkle root on an explicit
    /// partial-completion audit record so external retry stays
    /// possible (spec.md §4.4).
    pub async fn anchor_timeout(&self, id: SessionId) -> Result<(), PipelineError> {
        let root_hex = self
            .with_session(id, |r| {
                let root = r.session.merkle_tree.as_ref().map(|t| hex_string(&t.root));
                Ok(root)
            })
            .await?
            .unwrap_or_default();
        self.fail(id, "anchor_timeout", &format!("partial completion, merkle_root={root_hex}"))
            .await
    }

    /// Any non-terminal state `-> FAILED`, with a terminal audit event.
    pub async fn fail(&self, id: SessionId, kind: &str, detail: &str) -> Result<(), PipelineError> {
        let from = self
            .with_session(id, |r| {
                let from = Self::transition(r, SessionState::Failed, kind)?;
                r.session
                    .audit_log
                    .push(AuditEvent::new("failed", format!("{kind}: {detail}")));
                r.session.ended_at = Some(now_unix());
                Ok(from)
            })
            .await?;
        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Failed,
        })
        .await;
        Ok(())
    }

    /// `PENDING`/`READY -> CANCELLED` on expiry before recording starts.
    pub async fn cancel(&self, id: SessionId) -> Result<(), PipelineError> {
        let from = self
            .with_session(id, |r| Self::transition(r, SessionState::Cancelled, "expiry"))
            .await?;
        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Cancelled,
        })
        .await;
        Ok(())
    }

    /// Cancellation while `RECORDING` (spec.md §5, §8 Scenario 5):
    /// drains any buffered trailing bytes as one final chunk, finalizes
    /// the Merkle tree over whatever was stored, and emits a terminal
    /// `cancelled` manifest without submitting an anchoring
    /// transaction. Chunks already durably stored remain for forensic
    /// retrieval.
    pub async fn cancel_during_recording(
        &self,
        id: SessionId,
        trailing_bytes: Option<Vec<u8>>,
    ) -> Result<SessionManifest, PipelineError> {
        if let Some(bytes) = trailing_bytes.filter(|b| !b.is_empty()) {
            let index = {
                let sessions = self.sessions.read().await;
                sessions
                    .get(&id)
                    .ok_or(PipelineError::SessionNotFound(id))?
                    .session
                    .next_chunk_index()
            };
            self.ingest_chunk(
                id,
                AssembledChunk {
                    index,
                    descriptors: Vec::new(),
                    bytes,
                },
            )
            .await?;
        }

        let (manifest, from) = self
            .with_session(id, |r| {
                let from = r.session.state;
                let builder = r.merkle.take().expect("merkle builder present once per session");
                let tree = builder.finalize(now_unix())?;
                r.session.merkle_tree = Some(tree.descriptor());
                r.session.state = SessionState::Cancelled;
                r.session
                    .audit_log
                    .push(AuditEvent::new("cancelled", "cancelled during recording"));
                r.session.ended_at = Some(now_unix());

                let chunk_hashes = r.session.chunks.iter().map(|c| c.ciphertext_hash).collect();
                let manifest = SessionManifest {
                    session_id: id,
                    user_id: r.session.owner_address.clone().unwrap_or_default(),
                    created_at: now_unix(),
                    total_chunks: tree.leaf_count(),
                    total_size_bytes: r.session.recorded_size,
                    merkle_root: tree.root(),
                    chunk_hashes,
                    metadata: serde_json::json!({"cancelled": true}),
                    signature: None,
                };
                Ok((manifest, from))
            })
            .await?;

        self.publish(LucidEvent::SessionStateChanged {
            session_id: id,
            from,
            to: SessionState::Cancelled,
        })
        .await;
        Ok(manifest)
    }

    /// Total seconds this session's capture intake has spent paused
    /// waiting on the durable-store queue.
    pub async fn stall_seconds(&self, id: SessionId) -> Result<u64, PipelineError> {
        self.with_session(id, |r| Ok(r.stall_seconds_total)).await
    }

    /// A read-only snapshot of the session for external consumers
    /// (status queries, the Anchoring Service, dashboards).
    pub async fn snapshot(&self, id: SessionId) -> Result<Session, PipelineError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|r| r.session.clone())
            .ok_or(PipelineError::SessionNotFound(id))
    }

    /// Whether intake for `id` should currently be paused because the
    /// durable-store queue is saturated.
    pub fn is_store_queue_saturated(&self) -> bool {
        self.store_queue.available_permits() == 0
    }
}

fn hex_string(hash: &lucid_types::Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
