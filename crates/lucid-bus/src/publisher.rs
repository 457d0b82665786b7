//! # Event Publisher
//!
//! The publishing side of the bus.

use crate::events::{EventFilter, LucidEvent};
use crate::nonce_cache::TimeBoundedNonceCache;
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Interface components use to emit events for consumption by others.
/// There are no direct calls between components: every cross-component
/// effect is observed here or not at all.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus. Returns the number of active
    /// subscribers that received it.
    async fn publish(&self, event: LucidEvent) -> usize;

    /// Total events published since the bus was created.
    fn events_published(&self) -> u64;
}

/// In-memory bus backed by `tokio::sync::broadcast`. Suitable for a
/// single `lucid-node` process; nothing here crosses a process boundary.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<LucidEvent>,
    nonce_cache: Arc<RwLock<TimeBoundedNonceCache>>,
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            nonce_cache: Arc::new(RwLock::new(TimeBoundedNonceCache::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(topic_key.clone()).or_insert(0) += 1;
        }

        debug!(topics = ?filter.topics, "new subscription");
        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn nonce_cache(&self) -> Arc<RwLock<TimeBoundedNonceCache>> {
        self.nonce_cache.clone()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: LucidEvent) -> usize {
        let topic = event.topic();

        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(topic = ?topic, receivers = receiver_count, "event published");
                receiver_count
            }
            Err(e) => {
                warn!(topic = ?topic, error = %e, "event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
