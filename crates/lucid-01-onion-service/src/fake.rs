//! In-memory `TorControlClient` for tests and for environments where a
//! real Tor control port isn't reachable.

use crate::control_client::TorControlClient;
use crate::errors::OnionError;
use crate::types::KeyMaterial;
use async_trait::async_trait;
use std::collections::HashSet;

#[derive(Default)]
pub struct FakeTorControlClient {
    installed: HashSet<String>,
    authenticated: bool,
    fail_authenticate: bool,
}

impl FakeTorControlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a control channel that never comes up.
    pub fn unavailable() -> Self {
        Self {
            fail_authenticate: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TorControlClient for FakeTorControlClient {
    async fn authenticate(&mut self) -> Result<(), OnionError> {
        if self.fail_authenticate {
            return Err(OnionError::TorUnavailable);
        }
        self.authenticated = true;
        Ok(())
    }

    async fn add_onion(
        &mut self,
        _port: u16,
        _target: &str,
        key: &KeyMaterial,
    ) -> Result<(String, Option<[u8; 32]>), OnionError> {
        if let KeyMaterial::Raw(bytes) = key {
            if bytes.len() != 32 {
                return Err(OnionError::KeyInvalid(format!(
                    "ed25519-v3 seed must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }

        let service_id = uuid::Uuid::new_v4().simple().to_string();
        self.installed.insert(service_id.clone());
        let seed = match key {
            KeyMaterial::Generate => Some([7u8; 32]),
            KeyMaterial::Raw(_) => None,
        };
        Ok((format!("{service_id}.onion"), seed))
    }

    async fn del_onion(&mut self, service_id: &str) -> Result<(), OnionError> {
        let bare = service_id.trim_end_matches(".onion");
        self.installed.remove(bare);
        Ok(())
    }

    async fn list_onions(&mut self) -> Result<Vec<String>, OnionError> {
        Ok(self.installed.iter().cloned().collect())
    }
}
