//! The Tor control-port client.
//!
//! Tor's control protocol is a simple line-oriented text protocol, not
//! a binary RPC - there is no need for a generic client library, and
//! hand-rolling the handful of commands this system issues
//! (`AUTHENTICATE`, `ADD_ONION`, `DEL_ONION`, `GETINFO`) keeps the
//! wire format under direct control.

use crate::errors::OnionError;
use crate::types::KeyMaterial;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// What the manager needs from a connection to Tor's control port.
#[async_trait]
pub trait TorControlClient: Send {
    async fn authenticate(&mut self) -> Result<(), OnionError>;

    /// Installs an onion service, returning its address and - if the
    /// key was freshly generated - the seed Tor derived it from.
    async fn add_onion(
        &mut self,
        port: u16,
        target: &str,
        key: &KeyMaterial,
    ) -> Result<(String, Option<[u8; 32]>), OnionError>;

    async fn del_onion(&mut self, service_id: &str) -> Result<(), OnionError>;

    /// Service ids Tor currently has installed.
    async fn list_onions(&mut self) -> Result<Vec<String>, OnionError>;
}

fn encode_add_onion_key(key: &KeyMaterial) -> Result<String, OnionError> {
    match key {
        KeyMaterial::Generate => Ok("NEW:ED25519-V3".to_string()),
        KeyMaterial::Raw(bytes) => {
            if bytes.len() != 32 {
                return Err(OnionError::KeyInvalid(format!(
                    "ed25519-v3 seed must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
            Ok(format!("ED25519-V3:{}", STANDARD.encode(bytes)))
        }
    }
}

/// A live connection to a local `tor` process's control port.
pub struct TcpTorControlClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl TcpTorControlClient {
    pub async fn connect(addr: &str) -> Result<Self, OnionError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|_| OnionError::TorUnavailable)?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    async fn write_line(&mut self, line: &str) -> Result<(), OnionError> {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .map_err(OnionError::Io)
    }

    async fn read_line(&mut self) -> Result<String, OnionError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.map_err(OnionError::Io)?;
        if n == 0 {
            return Err(OnionError::TorUnavailable);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads one complete reply: a run of `NNN-` continuation lines,
    /// `NNN+` multiline data blocks terminated by a lone `.`, and a
    /// final `NNN ` line.
    async fn read_reply(&mut self) -> Result<Vec<String>, OnionError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.len() < 4 {
                return Err(OnionError::ControlProtocol(line));
            }
            let code = &line[..3];
            let separator = line.as_bytes()[3];

            if code.starts_with('4') || code.starts_with('5') {
                return Err(OnionError::ControlProtocol(line));
            }

            match separator {
                b' ' => {
                    lines.push(line);
                    break;
                }
                b'-' => lines.push(line),
                b'+' => {
                    lines.push(line);
                    loop {
                        let body_line = self.read_line().await?;
                        if body_line == "." {
                            break;
                        }
                        lines.push(body_line);
                    }
                }
                _ => return Err(OnionError::ControlProtocol(line)),
            }
        }
        Ok(lines)
    }

    async fn command(&mut self, line: &str) -> Result<Vec<String>, OnionError> {
        self.write_line(line).await?;
        self.read_reply().await
    }
}

#[async_trait]
impl TorControlClient for TcpTorControlClient {
    async fn authenticate(&mut self) -> Result<(), OnionError> {
        self.command("AUTHENTICATE \"\"").await?;
        Ok(())
    }

    async fn add_onion(
        &mut self,
        port: u16,
        target: &str,
        key: &KeyMaterial,
    ) -> Result<(String, Option<[u8; 32]>), OnionError> {
        let key_part = encode_add_onion_key(key)?;
        let reply = self
            .command(&format!("ADD_ONION {key_part} Flags=Detach Port={port},{target}"))
            .await?;

        let mut fields: HashMap<String, String> = HashMap::new();
        for line in &reply {
            if let Some((_, rest)) = line.split_once(['-', '+', ' ']) {
                if let Some((k, v)) = rest.split_once('=') {
                    fields.insert(k.to_string(), v.to_string());
                }
            }
        }

        let service_id = fields
            .remove("ServiceID")
            .ok_or_else(|| OnionError::ControlProtocol("ADD_ONION reply missing ServiceID".into()))?;
        let onion_address = format!("{service_id}.onion");

        let seed = match fields.remove("PrivateKey") {
            Some(blob) => {
                let (_, encoded) = blob
                    .split_once(':')
                    .ok_or_else(|| OnionError::ControlProtocol("malformed PrivateKey field".into()))?;
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| OnionError::ControlProtocol(format!("bad PrivateKey encoding: {e}")))?;
                let mut seed = [0u8; 32];
                let n = bytes.len().min(32);
                seed[..n].copy_from_slice(&bytes[..n]);
                Some(seed)
            }
            None => None,
        };

        Ok((onion_address, seed))
    }

    async fn del_onion(&mut self, service_id: &str) -> Result<(), OnionError> {
        self.command(&format!("DEL_ONION {service_id}")).await?;
        Ok(())
    }

    async fn list_onions(&mut self) -> Result<Vec<String>, OnionError> {
        let reply = self.command("GETINFO onions/current").await?;
        Ok(reply
            .into_iter()
            .skip(1)
            .filter(|line| !line.starts_with("250"))
            .collect())
    }
}
