//! Adapters implementing the outbound ports that component crates
//! define but don't implement themselves: the Anchoring Service client
//! the Session Pipeline Coordinator submits manifests through, and the
//! push-to-pull bridge feeding RDP-sourced bytes into the Chunk
//! Assembler's `CaptureSource`.

pub mod anchor_port;
pub mod capture_channel;

pub use anchor_port::LiveAnchorPort;
pub use capture_channel::ChannelCaptureSource;
