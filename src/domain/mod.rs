//! Domain layer public interface.
//!
//! This module defines the publish/subscribe abstractions that are
//! independent of any concrete transport, broker, or wire format.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod envelope;
mod message;
mod publisher;
mod subscriber;

// --- Domain re-exports ---

pub(crate) use envelope::Envelope;
pub(crate) use subscriber::ResolvedOptions;

pub use message::{JsonMessage, Message};
pub use publisher::{Publisher, PublisherPtr};
pub use subscriber::{
    //
    ConsumeFn,
    ErrorPolicy,
    ErrorSink,
    SubscribeOptions,
    Subscriber,
    SubscriberPtr,
    DEFAULT_GROUP,
};
