//! Boots one Lucid node: the onion service, the session/payment/chain
//! stacks, and the RDP listener that ties them together over one
//! event bus. Exposed as a library so integration tests can build a
//! [`container::SubsystemContainer`] without going through `main`.

pub mod adapters;
pub mod anchor_watcher;
pub mod container;
pub mod genesis;
pub mod policy;
pub mod rdp_listener;
