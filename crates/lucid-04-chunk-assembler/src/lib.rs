//! Buffers a session's capture payloads into chunks.
//!
//! Emits a chunk when either the accumulator reaches the configured
//! size, or it is non-empty and no payload has arrived within the
//! flush-timeout window. Within one session chunk indices are assigned
//! in strict emission order and never reordered downstream.

#![warn(missing_docs)]

use lucid_03_capture::{CaptureSource, Payload, PayloadKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Default accumulator size before a size-triggered emission.
pub const DEFAULT_CHUNK_SIZE_BYTES: u64 = 8 * 1024 * 1024;

/// Default idle window before a timeout-triggered emission.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// One payload's contribution to an assembled chunk, recorded in
/// arrival order.
#[derive(Debug, Clone)]
pub struct PayloadDescriptor {
    pub kind: PayloadKind,
    pub monotonic_timestamp: u64,
    pub size: usize,
}

/// A chunk as it leaves the assembler: raw concatenated bytes plus the
/// ordered descriptors of every payload that contributed to it.
#[derive(Debug, Clone)]
pub struct AssembledChunk {
    pub index: u64,
    pub descriptors: Vec<PayloadDescriptor>,
    pub bytes: Vec<u8>,
}

/// Buffers payloads for one session and emits chunks under the
/// size/timeout rule.
pub struct ChunkAssembler {
    max_bytes: u64,
    flush_timeout: Duration,
    buffer: Vec<u8>,
    descriptors: Vec<PayloadDescriptor>,
    next_index: u64,
}

impl ChunkAssembler {
    pub fn new(max_bytes: u64, flush_timeout: Duration) -> Self {
        Self {
            max_bytes,
            flush_timeout,
            buffer: Vec::new(),
            descriptors: Vec::new(),
            next_index: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_FLUSH_TIMEOUT)
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn push(&mut self, payload: Payload) -> Option<AssembledChunk> {
        self.descriptors.push(PayloadDescriptor {
            kind: payload.kind,
            monotonic_timestamp: payload.monotonic_timestamp,
            size: payload.bytes.len(),
        });
        self.buffer.extend_from_slice(&payload.bytes);

        if self.buffer.len() as u64 >= self.max_bytes {
            Some(self.emit())
        } else {
            None
        }
    }

    fn emit(&mut self) -> AssembledChunk {
        let index = self.next_index;
        self.next_index += 1;
        AssembledChunk {
            index,
            descriptors: std::mem::take(&mut self.descriptors),
            bytes: std::mem::take(&mut self.buffer),
        }
    }

    fn flush_if_nonempty(&mut self) -> Option<AssembledChunk> {
        if self.is_empty() {
            None
        } else {
            Some(self.emit())
        }
    }

    /// Drains `source` to completion, sending emitted chunks to
    /// `chunks` as they are assembled. Returns once the source is
    /// drained and any trailing partial chunk has been flushed.
    pub async fn run(
        mut self,
        mut source: impl CaptureSource,
        chunks: mpsc::Sender<AssembledChunk>,
    ) {
        loop {
            tokio::select! {
                biased;

                payload = source.next_payload() => {
                    match payload {
                        Some(payload) => {
                            if let Some(chunk) = self.push(payload) {
                                if chunks.send(chunk).await.is_err() {
                                    return;
                                }
                            }
                        }
                        None => {
                            if let Some(chunk) = self.flush_if_nonempty() {
                                let _ = chunks.send(chunk).await;
                            }
                            return;
                        }
                    }
                }

                _ = tokio::time::sleep(self.flush_timeout), if !self.is_empty() => {
                    if let Some(chunk) = self.flush_if_nonempty() {
                        if chunks.send(chunk).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_03_capture::FixedCaptureSource;

    #[tokio::test]
    async fn emits_chunks_of_24_mib_in_8_mib_pieces() {
        let payload = vec![0u8; 8 * 1024 * 1024];
        let source = FixedCaptureSource::new(vec![
            Payload::new(PayloadKind::VideoFrame, 0, payload.clone()),
            Payload::new(PayloadKind::VideoFrame, 1, payload.clone()),
            Payload::new(PayloadKind::VideoFrame, 2, payload),
        ]);

        let (tx, mut rx) = mpsc::channel(8);
        let assembler = ChunkAssembler::with_defaults();
        tokio::spawn(assembler.run(source, tx));

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[2].index, 2);
        for chunk in &chunks {
            assert_eq!(chunk.bytes.len(), 8 * 1024 * 1024);
        }
    }

    #[tokio::test]
    async fn flushes_a_partial_trailing_chunk_on_source_drain() {
        let source = FixedCaptureSource::new(vec![Payload::new(
            PayloadKind::AudioFrame,
            0,
            vec![1, 2, 3],
        )]);

        let (tx, mut rx) = mpsc::channel(4);
        let assembler = ChunkAssembler::with_defaults();
        tokio::spawn(assembler.run(source, tx));

        let chunk = rx.recv().await.unwrap();
        assert_eq!(chunk.index, 0);
        assert_eq!(chunk.bytes, vec![1, 2, 3]);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn timeout_flush_emits_before_the_source_drains() {
        let assembler = ChunkAssembler::new(DEFAULT_CHUNK_SIZE_BYTES, Duration::from_millis(50));

        struct SlowSource {
            sent: bool,
        }

        #[async_trait::async_trait]
        impl CaptureSource for SlowSource {
            async fn next_payload(&mut self) -> Option<Payload> {
                if !self.sent {
                    self.sent = true;
                    Some(Payload::new(PayloadKind::Control, 0, vec![9]))
                } else {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    None
                }
            }
        }

        let (tx, mut rx) = mpsc::channel(4);
        tokio::spawn(assembler.run(SlowSource { sent: false }, tx));

        let chunk = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timeout flush should have emitted")
            .unwrap();
        assert_eq!(chunk.bytes, vec![9]);
    }
}
