//! Bridges the Session Pipeline Coordinator's [`AnchorPort`] to the
//! real [`AnchoringService`]. `submit_manifest` on the port is
//! infallible by contract - the coordinator cannot stall a session on
//! a mempool hiccup - so a submission failure here is logged and the
//! caller still gets back the manifest-hash-derived transaction id,
//! which is what a later retry would coalesce onto anyway.

use async_trait::async_trait;
use lucid_08_session_pipeline::AnchorPort;
use lucid_13_anchoring::{derive_transaction_id, AnchoringService};
use lucid_types::{Hash, HashAlgorithm, SessionManifest};
use std::sync::Arc;
use tracing::warn;

pub struct LiveAnchorPort {
    anchoring: Arc<AnchoringService>,
    algorithm: HashAlgorithm,
}

impl LiveAnchorPort {
    #[must_use]
    pub fn new(anchoring: Arc<AnchoringService>, algorithm: HashAlgorithm) -> Self {
        Self { anchoring, algorithm }
    }
}

#[async_trait]
impl AnchorPort for LiveAnchorPort {
    async fn submit_manifest(&self, manifest: SessionManifest) -> Hash {
        let owner = manifest.session_id.0.to_string();
        let manifest_hash = manifest.hash();
        match self.anchoring.submit_manifest(&manifest, self.algorithm, owner).await {
            Ok(txid) => txid,
            Err(err) => {
                warn!(session = %manifest.session_id.0, %err, "manifest submission to the mempool failed");
                derive_transaction_id(manifest_hash)
            }
        }
    }
}
