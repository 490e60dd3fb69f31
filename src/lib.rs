//! Typed publish/subscribe with once-per-group delivery.
//!
//! Producers publish [`Message`]s; consumers subscribe to a set of message
//! types under a named group. Every message is delivered to at most one
//! consumer per subscribing group, so several consumers sharing a group
//! split the load while different groups each see every message.
//!
//! The crate ships an in-memory bus ([`create_memory_bus`]) whose dispatch
//! engine fans messages out to a dynamic set of consumers, routes consumer
//! failures to per-consumer error sinks, and tears consumers down
//! independently through cancellation.
//!
//! ```
//! # async fn example() -> mom_deliver::Result<()> {
//! use mom_deliver::{create_memory_bus, BusConfig, ConsumeFn, Publisher, Subscriber, SubscribeOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let (publisher, subscriber) = create_memory_bus(&BusConfig::new().with_block_on_full(true));
//! let cancel = CancellationToken::new();
//!
//! let options = SubscribeOptions::new(ConsumeFn::new(|message_type, payload| async move {
//!     println!("{message_type}: {} bytes", payload.len());
//!     Ok(())
//! }))
//! .group("message-logger")
//! .message_type("user.created")
//! .ignore_errors();
//!
//! let consumer = tokio::spawn({
//!     let cancel = cancel.clone();
//!     async move { subscriber.subscribe(cancel, options).await }
//! });
//!
//! // ... publisher.publish(&message).await? ...
//!
//! cancel.cancel();
//! consumer.await.expect("consumer task panicked")?;
//! publisher.close().await?;
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod domain;
mod transport;

mod bus_builder;
mod bus_config;
mod fanout;
mod macros;

mod error;
mod registration_id;

#[allow(unused_imports)]
pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use bus_builder::MemoryBusBuilder;
pub use bus_config::BusConfig;
pub use fanout::subscribe_many;

pub use error::{Error, Result, ValidationError};
pub use registration_id::RegistrationId;

pub use transport::{
    //
    create_memory_bus,
    MemoryPublisher,
    MemorySubscriber,
    ObservedMessage,
    ObservedPublisher,
};

// --- public re-exports
pub use domain::{
    //
    ConsumeFn,
    ErrorPolicy,
    ErrorSink,
    JsonMessage,
    Message,
    Publisher,
    PublisherPtr,
    SubscribeOptions,
    Subscriber,
    SubscriberPtr,
    DEFAULT_GROUP,
};
