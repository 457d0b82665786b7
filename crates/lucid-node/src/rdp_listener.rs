//! The RDP TCP listener: accepts connections behind the onion
//! service's local target, negotiates the handshake, and pairs each
//! connection with its own capture pipeline for the life of the
//! session (spec.md §4.5).
//!
//! The handshake wire format is newline-delimited JSON, chosen because
//! nothing upstream of this module specifies one: a `ClientHello` line
//! declaring the client's protocol version, a `ServerChallenge` line
//! carrying the session id and ephemeral key, and a `ClientAuth` line
//! with the owner's signature over them. Once the handshake completes
//! the connection switches to the raw length-prefixed PDU framing
//! `lucid-09-rdp-handler` parses.

use crate::container::SubsystemContainer;
use crate::policy::default_policy;
use lucid_03_capture::{Payload, PayloadKind};
use lucid_04_chunk_assembler::AssembledChunk;
use lucid_crypto::Ed25519KeyPair;
use lucid_types::{now_unix, Policy, SessionId};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Serialize, Deserialize)]
struct ClientHello {
    client_version: u32,
}

#[derive(Serialize, Deserialize)]
struct ServerChallenge {
    session_id: String,
    server_version: u32,
    ephemeral_public_key: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct ClientAuth {
    owner_public_key: Vec<u8>,
    signature: Vec<u8>,
}

pub async fn serve(
    container: Arc<SubsystemContainer>,
    node_identity: Arc<Ed25519KeyPair>,
    host: &str,
    port: u16,
) -> io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(%host, port, "rdp listener bound");

    loop {
        let (stream, peer) = listener.accept().await?;
        let container = container.clone();
        let node_identity = node_identity.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &container, &node_identity).await {
                warn!(%peer, %err, "rdp connection ended with an error");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    container: &SubsystemContainer,
    node_identity: &Ed25519KeyPair,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let hello: ClientHello = serde_json::from_str(line.trim())?;
    lucid_09_rdp_handler::negotiate_version(hello.client_version)?;

    let policy = default_policy(node_identity);
    let session_id = container.coordinator.create_session(policy.clone()).await;
    let (challenge, _ephemeral) = lucid_09_rdp_handler::begin_handshake(session_id);

    let challenge_line = serde_json::to_string(&ServerChallenge {
        session_id: session_id.to_string(),
        server_version: challenge.server_version,
        ephemeral_public_key: challenge.ephemeral_public_key.to_vec(),
    })?;
    write_half.write_all(challenge_line.as_bytes()).await?;
    write_half.write_all(b"\n").await?;

    let mut auth_line = String::new();
    let auth: ClientAuth = lucid_09_rdp_handler::await_within_timeout(async {
        reader
            .read_line(&mut auth_line)
            .await
            .map_err(|err| lucid_09_rdp_handler::RdpError::MalformedHandshake(err.to_string()))?;
        serde_json::from_str(auth_line.trim())
            .map_err(|err| lucid_09_rdp_handler::RdpError::MalformedHandshake(err.to_string()))
    })
    .await?;

    let owner_public_key: [u8; 32] = auth
        .owner_public_key
        .try_into()
        .map_err(|_| "owner public key must be 32 bytes")?;
    let signature: [u8; 64] = auth.signature.try_into().map_err(|_| "signature must be 64 bytes")?;
    let auth_blob = lucid_09_rdp_handler::AuthBlob { owner_public_key, signature };
    lucid_09_rdp_handler::verify_auth_blob(&challenge, &auth_blob)?;

    let owner_address = hex_string(&owner_public_key);
    container.coordinator.rdp_handshake_ok(session_id, owner_address).await?;

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<AssembledChunk>(64);
    let capture = container.spawn_capture(chunk_tx);

    let coordinator = container.coordinator.clone();
    let ingest_task = tokio::spawn(async move {
        while let Some(chunk) = chunk_rx.recv().await {
            if let Err(err) = coordinator.ingest_chunk(session_id, chunk).await {
                warn!(%err, "chunk ingestion failed");
            }
        }
    });

    let started_at = now_unix();
    read_frames(&mut reader, container, session_id, &policy, &capture.sender, started_at).await;

    drop(capture.sender);
    let _ = ingest_task.await;

    if let Err(err) = container.coordinator.capture_eof(session_id).await {
        warn!(%err, "capture_eof failed");
    }
    Ok(())
}

async fn read_frames(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    container: &SubsystemContainer,
    session_id: SessionId,
    policy: &Policy,
    payloads: &mpsc::Sender<Payload>,
    started_at: u64,
) {
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut scratch = [0u8; 4096];
    loop {
        match reader.read(&mut scratch).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&scratch[..n]),
            Err(err) => {
                warn!(%err, "rdp socket read failed");
                break;
            }
        }

        loop {
            match lucid_09_rdp_handler::process_frame(&buf, policy) {
                Ok((outcome, consumed)) => {
                    buf.drain(..consumed);
                    match outcome {
                        lucid_09_rdp_handler::Outcome::Forward { payload_kind, bytes } => {
                            let kind = match payload_kind {
                                "video_frame" => PayloadKind::VideoFrame,
                                "control" => PayloadKind::Control,
                                _ => PayloadKind::Metadata,
                            };
                            let timestamp = now_unix().saturating_sub(started_at) * 1000;
                            if payloads.send(Payload::new(kind, timestamp, bytes)).await.is_err() {
                                return;
                            }
                        }
                        lucid_09_rdp_handler::Outcome::Denied { pdu_type } => {
                            let detail = format!("{pdu_type:?} denied by session policy");
                            if let Err(err) = container
                                .coordinator
                                .record_policy_violation(session_id, "policy-denied", &detail, false)
                                .await
                            {
                                warn!(%err, "recording policy violation failed");
                            }
                        }
                    }
                }
                Err(lucid_09_rdp_handler::RdpError::TruncatedHeader { .. }) => break,
                Err(err) => {
                    warn!(%err, "rdp frame rejected; closing connection");
                    return;
                }
            }
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
