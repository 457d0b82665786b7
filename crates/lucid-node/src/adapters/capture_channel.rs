//! Adapts a push source (bytes arriving off an RDP socket) to the
//! Chunk Assembler's pull-based [`CaptureSource`]: the socket-reading
//! task pushes [`Payload`]s into the channel as PDUs are decoded, and
//! the assembler drains the receiving half at its own pace, exactly as
//! it would drain a real screen/audio capture fixture.

use async_trait::async_trait;
use lucid_03_capture::{CaptureSource, Payload};
use tokio::sync::mpsc;

/// Channel capacity before a socket reader blocks on a slow assembler.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[must_use]
pub fn channel(capacity: usize) -> (mpsc::Sender<Payload>, ChannelCaptureSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChannelCaptureSource { rx })
}

pub struct ChannelCaptureSource {
    rx: mpsc::Receiver<Payload>,
}

#[async_trait]
impl CaptureSource for ChannelCaptureSource {
    async fn next_payload(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_03_capture::PayloadKind;

    #[tokio::test]
    async fn payloads_sent_on_the_channel_arrive_in_order() {
        let (tx, mut source) = channel(DEFAULT_CHANNEL_CAPACITY);
        tx.send(Payload::new(PayloadKind::VideoFrame, 0, vec![1])).await.unwrap();
        tx.send(Payload::new(PayloadKind::VideoFrame, 16, vec![2])).await.unwrap();
        drop(tx);

        assert_eq!(source.next_payload().await.unwrap().bytes, vec![1]);
        assert_eq!(source.next_payload().await.unwrap().bytes, vec![2]);
        assert!(source.next_payload().await.is_none());
    }
}
