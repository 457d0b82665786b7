//! # Lucid Event Bus
//!
//! The sole channel for inter-component communication within
//! `lucid-node`. Direct calls between components are forbidden; every
//! observable effect is a published `LucidEvent`.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Component A │                    │  Component B │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Security
//!
//! - Time-bounded nonce cache prevents replay of signed envelopes.
//! - Critical errors route to the dead-letter topic for operator attention.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod nonce_cache;
pub mod publisher;
pub mod subscriber;

pub use events::{ControlQueryError, EventFilter, EventTopic, LucidEvent};
pub use nonce_cache::TimeBoundedNonceCache;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Current protocol version for bus messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead-letter topic name for failed/critical messages.
pub const DLQ_TOPIC: &str = "dlq.critical";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_version_is_one() {
        assert_eq!(PROTOCOL_VERSION, 1);
    }

    #[test]
    fn default_capacity_is_1000() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
