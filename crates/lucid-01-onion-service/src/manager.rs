//! The Onion Service Manager: registry lifecycle and Tor reconciliation.

use crate::control_client::TorControlClient;
use crate::errors::OnionError;
use crate::types::{CreateRequest, KeyMaterial, OnionServiceRecord, RotationResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Owns the on-disk service registry and the control-channel
/// connection it reconciles against.
pub struct OnionServiceManager<C: TorControlClient> {
    control: C,
    registry_path: PathBuf,
    key_dir: PathBuf,
    records: HashMap<String, OnionServiceRecord>,
}

impl<C: TorControlClient> OnionServiceManager<C> {
    /// Authenticates to the control channel, loads the registry, and
    /// re-installs any record Tor no longer has.
    pub async fn new(
        mut control: C,
        registry_path: PathBuf,
        key_dir: PathBuf,
    ) -> Result<Self, OnionError> {
        control.authenticate().await?;
        let records = Self::load_registry(&registry_path)?;

        let mut manager = Self {
            control,
            registry_path,
            key_dir,
            records,
        };
        manager.reconcile().await?;
        Ok(manager)
    }

    fn load_registry(path: &Path) -> Result<HashMap<String, OnionServiceRecord>, OnionError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Ok(HashMap::new());
        }
        let records: Vec<OnionServiceRecord> = serde_json::from_slice(&bytes)?;
        Ok(records.into_iter().map(|r| (r.service_id.clone(), r)).collect())
    }

    fn save_registry(&self) -> Result<(), OnionError> {
        use std::io::Write;

        if let Some(parent) = self.registry_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let records: Vec<&OnionServiceRecord> = self.records.values().collect();
        let bytes = serde_json::to_vec_pretty(&records)?;

        let temp_path = self.registry_path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.registry_path)?;
        Ok(())
    }

    fn write_key_material(&self, service_id: &str, seed: &[u8]) -> Result<PathBuf, OnionError> {
        let dir = self.key_dir.join(service_id);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("private_key");
        std::fs::write(&path, seed)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }

    async fn reconcile(&mut self) -> Result<(), OnionError> {
        let live: HashSet<String> = self.control.list_onions().await?.into_iter().collect();
        let stale: Vec<String> = self
            .records
            .values()
            .filter(|r| !r.removed && !live.contains(&r.service_id))
            .map(|r| r.service_id.clone())
            .collect();

        if stale.is_empty() {
            return Ok(());
        }

        for service_id in &stale {
            let record = self.records.get(service_id).unwrap().clone();
            let key_bytes = std::fs::read(&record.key_path)?;
            let target = format!("{}:{}", record.target_host, record.target_port);
            let (address, _seed) = self
                .control
                .add_onion(record.onion_port, &target, &KeyMaterial::Raw(key_bytes))
                .await?;

            if let Some(r) = self.records.get_mut(service_id) {
                r.onion_address = address;
            }
        }

        self.save_registry()
    }

    /// Installs a new onion service and persists its record.
    pub async fn create(&mut self, request: CreateRequest) -> Result<OnionServiceRecord, OnionError> {
        if !request.ephemeral {
            if let Some(name) = &request.name {
                let collides = self.records.values().any(|r| {
                    !r.removed && !r.ephemeral && r.name.as_deref() == Some(name.as_str())
                });
                if collides {
                    return Err(OnionError::Conflict(name.clone()));
                }
            }
        }

        if let KeyMaterial::Raw(bytes) = &request.key {
            if bytes.len() != 32 {
                return Err(OnionError::KeyInvalid(format!(
                    "ed25519-v3 seed must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }

        let target = format!("{}:{}", request.target_host, request.target_port);
        let (onion_address, seed) = self
            .control
            .add_onion(request.onion_port, &target, &request.key)
            .await?;
        let service_id = onion_address.trim_end_matches(".onion").to_string();

        let key_bytes = match (&request.key, seed) {
            (KeyMaterial::Raw(bytes), _) => bytes.clone(),
            (KeyMaterial::Generate, Some(seed)) => seed.to_vec(),
            (KeyMaterial::Generate, None) => {
                lucid_crypto::Ed25519KeyPair::generate().to_seed().to_vec()
            }
        };
        let key_path = self.write_key_material(&service_id, &key_bytes)?;

        let record = OnionServiceRecord {
            service_id: service_id.clone(),
            service_type: request.service_type,
            name: request.name,
            onion_address,
            onion_port: request.onion_port,
            target_host: request.target_host,
            target_port: request.target_port,
            key_path: key_path.to_string_lossy().to_string(),
            ephemeral: request.ephemeral,
            created_at: lucid_types::now_unix(),
            removed: false,
        };

        self.records.insert(service_id, record.clone());
        self.save_registry()?;
        Ok(record)
    }

    /// Idempotent: absent ids return `false`; present ids are removed
    /// from the registry and from Tor.
    pub async fn remove(&mut self, service_id: &str) -> Result<bool, OnionError> {
        let already_removed = match self.records.get(service_id) {
            Some(record) => record.removed,
            None => return Ok(false),
        };
        if already_removed {
            return Ok(false);
        }

        self.control.del_onion(service_id).await?;
        if let Some(record) = self.records.get_mut(service_id) {
            record.removed = true;
        }
        self.save_registry()?;
        Ok(true)
    }

    /// Snapshot of every non-removed record.
    pub fn list(&self) -> Vec<OnionServiceRecord> {
        self.records.values().filter(|r| !r.removed).cloned().collect()
    }

    /// Tears down the old address and installs a new one for the same
    /// logical service. The old address is returned for the caller to
    /// emit as an audit event.
    pub async fn rotate(&mut self, service_id: &str) -> Result<RotationResult, OnionError> {
        let record = self
            .records
            .get(service_id)
            .filter(|r| !r.removed)
            .cloned()
            .ok_or_else(|| OnionError::NotFound(service_id.to_string()))?;

        self.control.del_onion(service_id).await?;

        let target = format!("{}:{}", record.target_host, record.target_port);
        let (new_address, seed) = self
            .control
            .add_onion(record.onion_port, &target, &KeyMaterial::Generate)
            .await?;
        let new_service_id = new_address.trim_end_matches(".onion").to_string();
        let seed_bytes = seed
            .map(|s| s.to_vec())
            .unwrap_or_else(|| lucid_crypto::Ed25519KeyPair::generate().to_seed().to_vec());
        let key_path = self.write_key_material(&new_service_id, &seed_bytes)?;

        self.records.remove(service_id);
        let new_record = OnionServiceRecord {
            service_id: new_service_id.clone(),
            service_type: record.service_type,
            name: record.name.clone(),
            onion_address: new_address,
            onion_port: record.onion_port,
            target_host: record.target_host.clone(),
            target_port: record.target_port,
            key_path: key_path.to_string_lossy().to_string(),
            ephemeral: record.ephemeral,
            created_at: lucid_types::now_unix(),
            removed: false,
        };
        self.records.insert(new_service_id, new_record.clone());
        self.save_registry()?;

        Ok(RotationResult {
            old_onion_address: record.onion_address,
            record: new_record,
        })
    }
}
