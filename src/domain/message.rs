// src/domain/message.rs

//! Message contract.
//!
//! A [`Message`] is anything that can name its own type and move its state
//! to and from an opaque byte payload. Publishers only ever call
//! [`Message::message_type`] and [`Message::payload`]; consumers rebuild a
//! value from the delivered bytes with [`Message::with_payload`].
//!
//! The bus never inspects payload contents.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// A message that can be published and consumed.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use mom_deliver::{Error, Message, Result};
///
/// struct Ping(u8);
///
/// impl Message for Ping {
///     fn message_type(&self) -> &str {
///         "ping"
///     }
///
///     fn payload(&self) -> Result<Bytes> {
///         Ok(Bytes::copy_from_slice(&[self.0]))
///     }
///
///     fn with_payload(&mut self, payload: &[u8]) -> Result<()> {
///         match payload {
///             [seq] => {
///                 self.0 = *seq;
///                 Ok(())
///             }
///             _ => Err(Error::Encoding("ping payload must be one byte".into())),
///         }
///     }
/// }
///
/// let mut ping = Ping(0);
/// ping.with_payload(&[7]).unwrap();
/// assert_eq!(ping.payload().unwrap(), Bytes::from_static(&[7]));
/// ```
pub trait Message: Send + Sync {
    /// Type tag used to route the message to subscriptions.
    fn message_type(&self) -> &str;

    /// Encode the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) when the value
    /// cannot be serialized.
    fn payload(&self) -> Result<Bytes>;

    /// Validate the given payload and decode it into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) when the payload
    /// is not a valid encoding of this message.
    fn with_payload(&mut self, payload: &[u8]) -> Result<()>;
}

/// JSON-encoded message.
///
/// Any serde type with a type tag gets a [`Message`] implementation that
/// encodes with `serde_json`.
///
/// ```
/// use mom_deliver::{JsonMessage, Message};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct UserCreated {
///     username: String,
/// }
///
/// impl JsonMessage for UserCreated {
///     const MESSAGE_TYPE: &'static str = "user.created";
/// }
///
/// let created = UserCreated { username: "tom".into() };
/// assert_eq!(created.message_type(), "user.created");
///
/// let mut decoded = UserCreated::default();
/// decoded.with_payload(&created.payload().unwrap()).unwrap();
/// assert_eq!(decoded.username, "tom");
/// ```
pub trait JsonMessage: Serialize + DeserializeOwned + Send + Sync {
    /// Type tag shared by every value of this message kind.
    const MESSAGE_TYPE: &'static str;
}

impl<T> Message for T
where
    T: JsonMessage,
{
    fn message_type(&self) -> &str {
        T::MESSAGE_TYPE
    }

    fn payload(&self) -> Result<Bytes> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Bytes::from(bytes))
    }

    fn with_payload(&mut self, payload: &[u8]) -> Result<()> {
        *self = serde_json::from_slice(payload)?;
        Ok(())
    }
}
