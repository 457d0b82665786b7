//! Block storage boundary: the service only knows how to put and get
//! blocks by id, height, or session-anchor transaction; the backing
//! store (in-memory here, a durable registry in production) owns the
//! actual persistence and indexing.

use async_trait::async_trait;
use lucid_types::{Block, Hash};
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait BlockStorePort: Send + Sync {
    async fn get_by_id(&self, id: Hash) -> Option<Block>;
    async fn get_by_height(&self, height: u64) -> Option<Block>;
    async fn latest(&self) -> Option<Block>;
    async fn range(&self, start_height: u64, end_height: u64) -> Vec<Block>;
    async fn by_session_anchor(&self, session_anchor_id: Hash) -> Option<Block>;
    async fn put(&self, block: Block);
    async fn set_status(&self, id: Hash, status: lucid_types::BlockStatus);
}

#[derive(Default)]
pub struct InMemoryBlockStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<Hash, Block>,
    by_height: HashMap<u64, Hash>,
    by_session_anchor: HashMap<Hash, Hash>,
    highest: Option<u64>,
}

impl InMemoryBlockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockStorePort for InMemoryBlockStore {
    async fn get_by_id(&self, id: Hash) -> Option<Block> {
        self.inner.lock().expect("block store lock poisoned").by_id.get(&id).cloned()
    }

    async fn get_by_height(&self, height: u64) -> Option<Block> {
        let inner = self.inner.lock().expect("block store lock poisoned");
        inner.by_height.get(&height).and_then(|id| inner.by_id.get(id)).cloned()
    }

    async fn latest(&self) -> Option<Block> {
        let inner = self.inner.lock().expect("block store lock poisoned");
        let height = inner.highest?;
        inner.by_height.get(&height).and_then(|id| inner.by_id.get(id)).cloned()
    }

    async fn range(&self, start_height: u64, end_height: u64) -> Vec<Block> {
        let inner = self.inner.lock().expect("block store lock poisoned");
        (start_height..=end_height)
            .filter_map(|h| inner.by_height.get(&h).and_then(|id| inner.by_id.get(id)))
            .cloned()
            .collect()
    }

    async fn by_session_anchor(&self, session_anchor_id: Hash) -> Option<Block> {
        let inner = self.inner.lock().expect("block store lock poisoned");
        inner.by_session_anchor.get(&session_anchor_id).and_then(|id| inner.by_id.get(id)).cloned()
    }

    async fn put(&self, block: Block) {
        let mut inner = self.inner.lock().expect("block store lock poisoned");
        let height = block.header.height;
        inner.highest = Some(inner.highest.map_or(height, |h| h.max(height)));
        inner.by_height.insert(height, block.id);
        for anchor_id in &block.session_anchor_ids {
            inner.by_session_anchor.insert(*anchor_id, block.id);
        }
        inner.by_id.insert(block.id, block);
    }

    async fn set_status(&self, id: Hash, status: lucid_types::BlockStatus) {
        let mut inner = self.inner.lock().expect("block store lock poisoned");
        if let Some(block) = inner.by_id.get_mut(&id) {
            block.status = status;
        }
    }
}
