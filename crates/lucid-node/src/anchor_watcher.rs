//! Bridges chain confirmation depth to the Session Pipeline
//! Coordinator's `anchor_confirmed` transition.
//!
//! The Anchoring Service tracks submissions but has no notion of chain
//! height on its own; the Block Service and Consensus stack have no
//! notion of which transactions are session anchors. This watcher is
//! the only thing that reads both: it reacts to `BlockStatusChanged`
//! and feeds the anchor-carrying transactions it finds back into the
//! Anchoring Service's confirmation counter.
//!
//! Confirmation count is approximated as the confirmed block's depth
//! below the current tip at the moment its status changes, not
//! recomputed as later blocks extend the chain. A block promoted
//! straight to `Confirmed` and never revisited (no fork contention)
//! only ever reports one confirmation count here. Closing that gap
//! needs a watcher driven off every new block admission, not just
//! status transitions on the anchored block itself.

use crate::container::SubsystemContainer;
use lucid_bus::{EventFilter, EventTopic, LucidEvent};
use lucid_types::{BlockStatus, Hash, SessionAnchorPayload, TransactionType};
use std::sync::Arc;
use tracing::warn;

pub async fn run(container: Arc<SubsystemContainer>) {
    let mut subscription = container.bus.subscribe(EventFilter::topics(vec![EventTopic::Consensus]));
    while let Some(event) = subscription.recv().await {
        if let LucidEvent::BlockStatusChanged { block_id, status, .. } = event {
            if matches!(status, BlockStatus::Confirmed | BlockStatus::Finalized) {
                reconcile_block(&container, block_id).await;
            }
        }
    }
}

async fn reconcile_block(container: &SubsystemContainer, block_id: Hash) {
    let Ok(block) = container.blocks.get_by_id(block_id).await else { return };
    let Ok(latest) = container.blocks.latest().await else { return };
    let confirmation_count = (latest.header.height.saturating_sub(block.header.height) + 1) as u32;

    for transaction in &block.transactions {
        if transaction.tx_type != TransactionType::SessionAnchor {
            continue;
        }
        let Ok(payload) = serde_json::from_slice::<SessionAnchorPayload>(&transaction.payload) else {
            continue;
        };
        if container
            .anchoring
            .mark_included(payload.manifest_hash, block.id, block.header.height)
            .await
            .is_err()
        {
            continue;
        }
        match container.anchoring.record_confirmation(payload.manifest_hash, confirmation_count).await {
            Ok(Some(anchor)) => {
                if let Err(err) = container.coordinator.anchor_confirmed(payload.session_id, anchor).await {
                    warn!(session = %payload.session_id.0, %err, "anchor_confirmed rejected by the pipeline coordinator");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "recording anchor confirmation depth failed"),
        }
    }
}
