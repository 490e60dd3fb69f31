// src/domain/envelope.rs

//! Engine-internal message envelope.

use std::sync::Arc;

use bytes::Bytes;

/// A published message reduced to its routing tag and encoded payload.
///
/// Created by a publisher at `publish()` time, carried through the bus
/// channel, and dropped once the dispatch loop has fanned it out. Consumers
/// never see this type; they receive its two fields as callback arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Envelope {
    // ---
    /// Message type tag used for subscription matching.
    pub message_type: Arc<str>,

    /// Opaque payload bytes, as produced by [`Message::payload`](crate::Message::payload).
    pub payload: Bytes,
}

impl Envelope {
    /// Encode a message into an envelope.
    ///
    /// # Errors
    ///
    /// Propagates the message's own encoding failure.
    pub fn from_message(message: &dyn crate::Message) -> crate::Result<Self> {
        // ---
        let payload = message.payload()?;
        Ok(Self {
            message_type: Arc::from(message.message_type()),
            payload,
        })
    }
}
