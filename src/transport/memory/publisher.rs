// src/transport/memory/publisher.rs

//! In-memory publisher.
//!
//! Encodes messages into envelopes and pushes them onto the bus channel.
//! The paired [`MemorySubscriber`](crate::MemorySubscriber) owns the receive
//! end; this type only ever holds the send end.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::transport::lock_ignore_poison;
use crate::domain::Envelope;
use crate::{log_debug, log_warn, Error, Message, Publisher, Result};

/// Publisher half of an in-memory bus.
///
/// ## Semantics
///
/// - `publish()` fails with [`Error::ClosedResource`] once `close()` ran.
/// - With `block_on_full`, `publish()` waits for room in the channel and
///   envelopes reach the dispatch loop in publish order.
/// - Without it, the send happens on a detached task and `publish()`
///   returns at once; no ordering is guaranteed between such publishes.
/// - `close()` lets already-enqueued envelopes (and pending detached
///   sends) drain before the dispatch loop sees end-of-stream.
pub struct MemoryPublisher {
    // ---
    sender: Mutex<Option<mpsc::Sender<Envelope>>>,
    block_on_full: bool,
}

impl MemoryPublisher {
    pub(crate) fn new(sender: mpsc::Sender<Envelope>, block_on_full: bool) -> Self {
        // ---
        Self {
            sender: Mutex::new(Some(sender)),
            block_on_full,
        }
    }

    /// Whether `publish()` applies back-pressure.
    pub fn blocks_on_full(&self) -> bool {
        self.block_on_full
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        lock_ignore_poison(&self.sender).is_none()
    }
}

#[async_trait::async_trait]
impl Publisher for MemoryPublisher {
    // ---
    async fn publish(&self, message: &dyn Message) -> Result<()> {
        // ---
        // Clone the sender out so the lock is never held across an await.
        let sender = lock_ignore_poison(&self.sender)
            .clone()
            .ok_or(Error::ClosedResource)?;

        let envelope = Envelope::from_message(message)?;

        if self.block_on_full {
            sender
                .send(envelope)
                .await
                .map_err(|_| Error::ClosedResource)?;
        } else {
            tokio::spawn(async move {
                if let Err(err) = sender.send(envelope).await {
                    log_warn!(
                        "dropped {} message: dispatch loop is gone",
                        err.0.message_type
                    );
                }
            });
        }

        Ok(())
    }

    /// Close the publisher.
    ///
    /// When every message already published has been handled, the dispatch
    /// loop of the paired subscriber stops.
    async fn close(&self) -> Result<()> {
        // ---
        let sender = lock_ignore_poison(&self.sender).take();
        match sender {
            Some(_) => {
                log_debug!("memory publisher closed");
                Ok(())
            }
            None => Err(Error::AlreadyClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::JsonMessage;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Debug, Serialize, Deserialize)]
    struct Tick {
        seq: u32,
    }

    impl JsonMessage for Tick {
        const MESSAGE_TYPE: &'static str = "tick";
    }

    struct Unencodable;

    impl Message for Unencodable {
        fn message_type(&self) -> &str {
            "unencodable"
        }

        fn payload(&self) -> Result<bytes::Bytes> {
            Err(Error::Encoding("refused".into()))
        }

        fn with_payload(&mut self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_blocking_publish_enqueues_envelope() {
        // ---
        let (tx, mut rx) = mpsc::channel(4);
        let publisher = MemoryPublisher::new(tx, true);

        publisher.publish(&Tick { seq: 1 }).await.expect("publish");

        let envelope = rx.recv().await.expect("envelope");
        assert_eq!(&*envelope.message_type, "tick");
        assert_eq!(&envelope.payload[..], br#"{"seq":1}"#);
    }

    #[tokio::test]
    async fn test_non_blocking_publish_returns_while_channel_full() {
        // ---
        let (tx, mut rx) = mpsc::channel(1);
        let publisher = MemoryPublisher::new(tx, false);

        for seq in 0..3 {
            timeout(Duration::from_millis(100), publisher.publish(&Tick { seq }))
                .await
                .expect("publish must not wait for room")
                .expect("publish");
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            let envelope = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timed out waiting for envelope")
                .expect("channel open");
            received.push(envelope.payload);
        }
        assert_eq!(received.len(), 3);
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        // ---
        let (tx, _rx) = mpsc::channel(1);
        let publisher = MemoryPublisher::new(tx, true);

        publisher.close().await.expect("first close");
        assert!(publisher.is_closed());

        let result = publisher.publish(&Tick { seq: 1 }).await;
        assert!(matches!(result, Err(Error::ClosedResource)));
    }

    #[tokio::test]
    async fn test_double_close_fails() {
        // ---
        let (tx, _rx) = mpsc::channel(1);
        let publisher = MemoryPublisher::new(tx, false);

        publisher.close().await.expect("first close");
        let result = publisher.close().await;
        assert!(matches!(result, Err(Error::AlreadyClosed)));
    }

    #[tokio::test]
    async fn test_encoding_failure_is_not_enqueued() {
        // ---
        let (tx, mut rx) = mpsc::channel(1);
        let publisher = MemoryPublisher::new(tx, true);

        let result = publisher.publish(&Unencodable).await;
        assert!(matches!(result, Err(Error::Encoding(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_keeps_queued_envelopes() {
        // ---
        let (tx, mut rx) = mpsc::channel(4);
        let publisher = MemoryPublisher::new(tx, true);

        publisher.publish(&Tick { seq: 1 }).await.expect("publish");
        publisher.publish(&Tick { seq: 2 }).await.expect("publish");
        publisher.close().await.expect("close");

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
