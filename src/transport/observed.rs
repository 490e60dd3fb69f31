// src/transport/observed.rs

//! Recording publisher for tests.
//!
//! [`ObservedPublisher`] stands in for a real publisher when testing how an
//! application publishes messages: nothing is delivered, every message is
//! recorded in publish order instead.

use std::sync::RwLock;

use bytes::Bytes;

use super::{read_ignore_poison, write_ignore_poison};
use crate::{Message, Publisher, Result};

/// A message as seen by an [`ObservedPublisher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedMessage {
    /// Type tag of the published message.
    pub message_type: String,
    /// Encoded payload of the published message.
    pub payload: Bytes,
}

impl ObservedMessage {
    /// Decode the recorded payload into `target`.
    ///
    /// # Errors
    ///
    /// Propagates the target's decoding failure.
    pub fn decode_into(&self, target: &mut dyn Message) -> Result<()> {
        target.with_payload(&self.payload)
    }
}

/// Publisher that stores messages so they can be inspected later on.
///
/// ```
/// # async fn example() -> mom_deliver::Result<()> {
/// use mom_deliver::{JsonMessage, ObservedPublisher, Publisher};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct UserCreated { username: String }
///
/// impl JsonMessage for UserCreated {
///     const MESSAGE_TYPE: &'static str = "user.created";
/// }
///
/// let publisher = ObservedPublisher::new();
/// publisher.publish(&UserCreated { username: "tom".into() }).await?;
///
/// let messages = publisher.messages();
/// assert_eq!(messages.len(), 1);
///
/// let mut created = UserCreated::default();
/// messages[0].decode_into(&mut created)?;
/// assert_eq!(created.username, "tom");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ObservedPublisher {
    messages: RwLock<Vec<ObservedMessage>>,
}

impl ObservedPublisher {
    /// Create a publisher with no recorded messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every recorded message.
    pub fn clear(&self) {
        write_ignore_poison(&self.messages).clear();
    }

    /// Snapshot of the recorded messages, oldest first.
    pub fn messages(&self) -> Vec<ObservedMessage> {
        read_ignore_poison(&self.messages).clone()
    }
}

#[async_trait::async_trait]
impl Publisher for ObservedPublisher {
    /// Record the message.
    ///
    /// Only fails if the message cannot produce its payload.
    async fn publish(&self, message: &dyn Message) -> Result<()> {
        let observed = ObservedMessage {
            message_type: message.message_type().to_string(),
            payload: message.payload()?,
        };
        write_ignore_poison(&self.messages).push(observed);
        Ok(())
    }

    /// Performs no action.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
