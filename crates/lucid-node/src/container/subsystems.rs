//! Wires every Lucid component crate onto one event bus and hands back
//! the handles a listener needs to serve sessions.
//!
//! Construction order follows the dependency chain spec.md §2 draws
//! between components: the chain stack (mempool, anchoring, block
//! service, consensus) must exist before the session pipeline, since
//! the pipeline's anchor port submits into it; the compute backend
//! must exist before the compressor that wraps it.

use crate::adapters::LiveAnchorPort;
use crate::container::config::NodeConfig;
use crate::genesis::{Genesis, GenesisBuilder, GenesisConfig, GenesisError};
use lucid_01_onion_service::{OnionServiceManager, TcpTorControlClient};
use lucid_02_socks_proxy::SocksProxyManager;
use lucid_03_capture::Payload;
use lucid_04_chunk_assembler::{AssembledChunk, ChunkAssembler};
use lucid_05_compression::Compressor;
use lucid_08_session_pipeline::{InMemoryChunkStore, PipelineConfig, PipelineCoordinator};
use lucid_10_payment_acceptor::{PaymentAcceptor, ValidationRules};
use lucid_11_payment_processor::{
    default_rules, AlwaysConfirmNonInclusion, PaymentProcessor, ProcessorConfig,
    RecordingSettlementPort,
};
use lucid_13_anchoring::{AnchoringService, InMemoryMempool, MerkleProofService};
use lucid_14_block_service::{BlockService, InMemoryBlockStore, ValidationConfig};
use lucid_15_consensus::{ConsensusConfig, ConsensusService, ValidatorSet};
use lucid_bus::InMemoryEventBus;
use lucid_types::{HashAlgorithm, PublicKey};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Construction failures. A dead Tor control port is not one of these:
/// it degrades to `onion: None` rather than failing node startup, see
/// [`SubsystemContainer::onion`].
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("genesis construction failed: {0}")]
    Genesis(#[from] GenesisError),
    #[error("encryption setup failed: {0}")]
    Encryption(#[from] lucid_06_encryption::EncryptionError),
}

/// A live capture pipeline: feed [`Payload`]s into `sender` as an RDP
/// connection decodes them, the paired chunk assembler task drains and
/// forwards finished chunks on its own.
pub struct CaptureHandle {
    pub sender: mpsc::Sender<Payload>,
}

/// Every subsystem instance this node runs, wired together over
/// `bus`. Held behind `Arc` wherever a listener task needs its own
/// clone.
pub struct SubsystemContainer {
    /// Concrete, not `Arc<dyn EventPublisher>`: node-level watchers
    /// (the anchor-confirmation bridge) need `subscribe`, which isn't
    /// part of the publish-only port component crates depend on.
    pub bus: Arc<InMemoryEventBus>,
    pub genesis: Genesis,

    pub mempool: Arc<InMemoryMempool>,
    pub anchoring: Arc<AnchoringService>,
    pub proof_service: Arc<MerkleProofService>,
    pub blocks: Arc<BlockService>,
    pub consensus: Arc<ConsensusService>,

    pub coordinator: Arc<PipelineCoordinator>,

    pub acceptor: Arc<PaymentAcceptor>,
    pub processor: Arc<PaymentProcessor>,

    pub proxies: Arc<SocksProxyManager>,
    /// `None` when the configured Tor control port could not be
    /// reached or the registry reconciliation failed at startup; the
    /// node still serves RDP on its local listener in that case, it
    /// just isn't published as a hidden service.
    pub onion: Option<OnionServiceManager<TcpTorControlClient>>,
}

impl SubsystemContainer {
    pub async fn build(config: &NodeConfig, node_identity: PublicKey) -> Result<Self, ContainerError> {
        let bus = Arc::new(InMemoryEventBus::new());

        let genesis_validators = if config.chain.initial_validators.is_empty() {
            vec![(node_identity, 1)]
        } else {
            config.chain.initial_validators.clone()
        };
        let genesis = GenesisBuilder::new(GenesisConfig {
            initial_validators: genesis_validators,
            ..GenesisConfig::default()
        })
        .build()?;

        let mempool = Arc::new(InMemoryMempool::new());
        let anchoring = Arc::new(AnchoringService::new(bus.clone(), mempool.clone()));
        let proof_service = Arc::new(MerkleProofService::new(anchoring.clone()));

        let block_store = Arc::new(InMemoryBlockStore::new());
        let blocks = Arc::new(BlockService::new(bus.clone(), block_store, ValidationConfig::default()));
        blocks
            .admit(genesis.block.clone(), genesis.block.header.timestamp)
            .await
            .expect("a freshly built genesis block always passes its own validation checklist");

        let validators = ValidatorSet::new(0, genesis.validators.clone());
        let consensus_config = ConsensusConfig {
            finality_depth: config.chain.finality_depth,
            orphan_depth: config.chain.orphan_depth,
        };
        let consensus = Arc::new(ConsensusService::new(bus.clone(), blocks.clone(), validators, consensus_config));

        let compute = lucid_compute::auto_detect().expect("the cpu compute backend is always available");
        let compressor = Compressor::new(compute);
        let chunk_store = Arc::new(InMemoryChunkStore::default());
        let anchor_port = Arc::new(LiveAnchorPort::new(anchoring.clone(), HashAlgorithm::Blake3));

        let pipeline_config = PipelineConfig {
            chunk_store_queue_capacity: config.pipeline.chunk_store_queue_capacity,
            anchor_timeout: std::time::Duration::from_secs(config.pipeline.anchor_timeout_secs),
            ..PipelineConfig::default()
        };
        let coordinator = Arc::new(PipelineCoordinator::new(
            bus.clone(),
            compressor,
            config.pipeline.cipher,
            chunk_store,
            anchor_port,
            pipeline_config,
        )?);

        let acceptance_rules = ValidationRules {
            min_amount: config.payment.min_amount,
            max_amount: config.payment.max_amount,
            supported_tokens: config.payment.supported_tokens.iter().cloned().collect(),
            ..ValidationRules::default()
        };
        let acceptor = Arc::new(PaymentAcceptor::new(acceptance_rules, bus.clone()));

        let processor_config =
            ProcessorConfig { max_concurrent_jobs: config.payment.max_concurrent_jobs, ..ProcessorConfig::default() };
        let processor = Arc::new(PaymentProcessor::new(
            default_rules(),
            processor_config,
            bus.clone(),
            Arc::new(RecordingSettlementPort::default()),
            Arc::new(AlwaysConfirmNonInclusion { confirmed: true }),
        ));

        let proxies = Arc::new(SocksProxyManager::new());
        let onion = Self::connect_onion(config).await;
        if onion.is_some() {
            info!("onion service manager ready");
        }

        Ok(Self {
            bus,
            genesis,
            mempool,
            anchoring,
            proof_service,
            blocks,
            consensus,
            coordinator,
            acceptor,
            processor,
            proxies,
            onion,
        })
    }

    async fn connect_onion(config: &NodeConfig) -> Option<OnionServiceManager<TcpTorControlClient>> {
        let control = match TcpTorControlClient::connect(&config.onion.tor_control_addr).await {
            Ok(control) => control,
            Err(err) => {
                warn!(%err, addr = %config.onion.tor_control_addr, "tor control port unreachable; running without a hidden service");
                return None;
            }
        };
        match OnionServiceManager::new(control, config.onion.registry_path.clone(), config.onion.key_dir.clone()).await {
            Ok(manager) => Some(manager),
            Err(err) => {
                warn!(%err, "tor control authentication or registry reconciliation failed; running without a hidden service");
                None
            }
        }
    }

    /// Spawns a fresh [`ChunkAssembler`] draining a channel-backed
    /// capture source and returns the sender its paired RDP connection
    /// task pushes decoded payloads into.
    pub fn spawn_capture(&self, chunks: mpsc::Sender<AssembledChunk>) -> CaptureHandle {
        let (sender, source) = crate::adapters::capture_channel::channel(
            crate::adapters::capture_channel::DEFAULT_CHANNEL_CAPACITY,
        );
        tokio::spawn(async move {
            ChunkAssembler::with_defaults().run(source, chunks).await;
        });
        CaptureHandle { sender }
    }
}
