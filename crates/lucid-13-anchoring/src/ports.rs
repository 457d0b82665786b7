//! Mempool boundary: the Anchoring Service only knows how to hand a
//! transaction off for inclusion, never how the pool prioritizes or
//! persists it.

use async_trait::async_trait;
use lucid_types::Transaction;
use std::sync::Mutex;

#[async_trait]
pub trait MempoolPort: Send + Sync {
    async fn submit(&self, transaction: Transaction) -> Result<(), String>;
}

/// In-memory mempool for tests and local runs: always accepts.
#[derive(Default)]
pub struct InMemoryMempool {
    submitted: Mutex<Vec<Transaction>>,
}

impl InMemoryMempool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().expect("mempool lock poisoned").len()
    }
}

#[async_trait]
impl MempoolPort for InMemoryMempool {
    async fn submit(&self, transaction: Transaction) -> Result<(), String> {
        self.submitted.lock().expect("mempool lock poisoned").push(transaction);
        Ok(())
    }
}
