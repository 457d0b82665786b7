//! `ConsensusService`: the PoOT round orchestrator. Owns proposal
//! intake, vote tallying against quorum, handing quorum-reaching
//! blocks to the Block Service for admission, and the depth-finality /
//! orphan sweep (spec.md §4.9).

use crate::errors::ConsensusError;
use crate::fork_choice::ForkChoiceStore;
use crate::round::ConsensusRound;
use crate::validator::ValidatorSet;
use lucid_14_block_service::BlockService;
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_types::{Block, BlockStatus, ConsensusRecord, Hash, PublicKey, Vote};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Depth thresholds governing when a CONFIRMED block on the canonical
/// chain is promoted to FINALIZED, and when an unextended minority
/// fork is declared ORPHANED.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusConfig {
    pub finality_depth: u64,
    pub orphan_depth: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self { finality_depth: 6, orphan_depth: 6 }
    }
}

pub struct ConsensusService {
    bus: Arc<dyn EventPublisher>,
    blocks: Arc<BlockService>,
    validators: RwLock<ValidatorSet>,
    config: ConsensusConfig,
    rounds: RwLock<HashMap<Hash, ConsensusRound>>,
    pending: RwLock<HashMap<Hash, Block>>,
    fork_choice: RwLock<ForkChoiceStore>,
    orphaned: RwLock<HashSet<Hash>>,
}

impl ConsensusService {
    #[must_use]
    pub fn new(
        bus: Arc<dyn EventPublisher>,
        blocks: Arc<BlockService>,
        validators: ValidatorSet,
        config: ConsensusConfig,
    ) -> Self {
        Self {
            bus,
            blocks,
            validators: RwLock::new(validators),
            config,
            rounds: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            fork_choice: RwLock::new(ForkChoiceStore::new()),
            orphaned: RwLock::new(HashSet::new()),
        }
    }

    /// Opens a round for a newly proposed block, in the Proposal phase
    /// until the first vote arrives.
    pub async fn propose(&self, block: Block, proposer: PublicKey) -> Result<(), ConsensusError> {
        let mut rounds = self.rounds.write().await;
        if rounds.contains_key(&block.id) {
            return Err(ConsensusError::DuplicateProposal(block.id));
        }

        self.fork_choice.write().await.register_block(block.id, block.header.previous_hash, block.header.height);
        let height = block.header.height;
        let block_id = block.id;
        self.pending.write().await.insert(block_id, block);
        rounds.insert(block_id, ConsensusRound::new(block_id, proposer));
        drop(rounds);

        self.bus.publish(LucidEvent::BlockProposed { block_id, height, proposer }).await;
        Ok(())
    }

    /// Casts a vote into its round. Returns `true` if this vote just
    /// pushed the round to quorum and the block was admitted.
    pub async fn cast_vote(&self, vote: Vote, now: u64) -> Result<bool, ConsensusError> {
        if !self.validators.read().await.contains(&vote.node_id) {
            return Err(ConsensusError::UnknownValidator);
        }

        let block_id = vote.block_hash;
        let approve = vote.approve;
        let reached_quorum = {
            let mut rounds = self.rounds.write().await;
            let round = rounds.get_mut(&block_id).ok_or(ConsensusError::NoSuchRound(block_id))?;
            round.cast_vote(vote);
            let validators = self.validators.read().await;
            round.phase() != crate::round::RoundPhase::Finalized && round.has_approve_quorum(&validators)
        };

        self.bus.publish(LucidEvent::VoteCast { block_id, approve }).await;

        if reached_quorum {
            self.admit_quorum_block(block_id, now).await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn admit_quorum_block(&self, block_id: Hash, now: u64) -> Result<(), ConsensusError> {
        let mut candidate = self.pending.read().await.get(&block_id).cloned().ok_or(ConsensusError::NoSuchRound(block_id))?;

        let (votes, approve_stake, quorum_stake) = {
            let rounds = self.rounds.read().await;
            let round = rounds.get(&block_id).ok_or(ConsensusError::NoSuchRound(block_id))?;
            let validators = self.validators.read().await;
            (round.votes().cloned().collect::<Vec<_>>(), round.approve_stake(&validators), validators.quorum_stake())
        };
        candidate.consensus = Some(ConsensusRecord { votes, total_stake_voted: approve_stake, quorum_stake });

        let height = candidate.header.height;
        let incumbent = self.blocks.get_by_height(height).await.ok();

        if let Some(incumbent) = &incumbent {
            if incumbent.id != block_id {
                let mut fork_choice = self.fork_choice.write().await;
                fork_choice.record_vote_mass(block_id, approve_stake);
                let winner = fork_choice.choose_head(&[incumbent.id, block_id]);
                drop(fork_choice);

                if winner != Some(block_id) {
                    self.orphaned.write().await.insert(block_id);
                    if let Some(round) = self.rounds.write().await.get_mut(&block_id) {
                        round.mark_finalized();
                    }
                    return Ok(());
                }
            }
        }

        self.blocks.admit(candidate, now).await?;
        self.fork_choice.write().await.record_vote_mass(block_id, approve_stake);
        if let Some(incumbent) = incumbent {
            if incumbent.id != block_id {
                self.orphaned.write().await.insert(incumbent.id);
                self.blocks.set_status(incumbent.id, height, BlockStatus::Orphaned).await;
            }
        }
        if let Some(round) = self.rounds.write().await.get_mut(&block_id) {
            round.mark_finalized();
        }
        self.pending.write().await.remove(&block_id);
        Ok(())
    }

    /// Sweeps the canonical chain forward from its tip: CONFIRMED
    /// ancestors at least `finality_depth` behind the tip become
    /// FINALIZED; registered forks at least `orphan_depth` behind the
    /// tip that are not ancestors of it become ORPHANED.
    pub async fn run_finality_sweep(&self) {
        let Ok(tip) = self.blocks.latest().await else { return };
        let fork_choice = self.fork_choice.read().await;
        let ancestors: HashSet<Hash> = fork_choice.ancestors_of(tip.id).into_iter().collect();

        for &id in &ancestors {
            let Some(height) = fork_choice.height_of(id) else { continue };
            if tip.header.height.saturating_sub(height) < self.config.finality_depth {
                continue;
            }
            if let Ok(block) = self.blocks.get_by_id(id).await {
                if block.status == BlockStatus::Confirmed {
                    self.blocks.set_status(id, height, BlockStatus::Finalized).await;
                }
            }
        }

        for id in fork_choice.all_ids() {
            if ancestors.contains(&id) || self.orphaned.read().await.contains(&id) {
                continue;
            }
            let Some(height) = fork_choice.height_of(id) else { continue };
            if tip.header.height.saturating_sub(height) < self.config.orphan_depth {
                continue;
            }
            self.orphaned.write().await.insert(id);
            if let Ok(block) = self.blocks.get_by_id(id).await {
                if block.status != BlockStatus::Orphaned {
                    self.blocks.set_status(id, height, BlockStatus::Orphaned).await;
                }
            }
        }
    }

    pub async fn is_orphaned(&self, id: Hash) -> bool {
        self.orphaned.read().await.contains(&id)
    }
}
