//! The capture source contract.
//!
//! A capture source produces a lazy, finite sequence of timestamped
//! payloads for one session's duration. It is an external collaborator
//! (real screen/audio capture, or a recorded fixture in tests); this
//! crate only fixes the stream shape the rest of the pipeline drains.

#![warn(missing_docs)]

use async_trait::async_trait;
use std::collections::VecDeque;

/// What kind of payload a capture frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    VideoFrame,
    AudioFrame,
    Metadata,
    Control,
}

/// One unit produced by a capture source: raw bytes tagged with a kind
/// and a monotonic timestamp (milliseconds since session start).
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: PayloadKind,
    pub monotonic_timestamp: u64,
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn new(kind: PayloadKind, monotonic_timestamp: u64, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            monotonic_timestamp,
            bytes,
        }
    }
}

/// A finite, non-restartable stream of payloads for one session.
///
/// `next_payload` returns `None` once the source is drained - end of
/// session, not an error. The Chunk Assembler drains this stream to
/// completion on session close.
#[async_trait]
pub trait CaptureSource: Send {
    async fn next_payload(&mut self) -> Option<Payload>;
}

/// An in-memory capture source backed by a fixed sequence of payloads,
/// used by tests and by the local fixture-replay tooling.
pub struct FixedCaptureSource {
    remaining: VecDeque<Payload>,
}

impl FixedCaptureSource {
    pub fn new(payloads: Vec<Payload>) -> Self {
        Self {
            remaining: payloads.into(),
        }
    }
}

#[async_trait]
impl CaptureSource for FixedCaptureSource {
    async fn next_payload(&mut self) -> Option<Payload> {
        self.remaining.pop_front()
    }
}
