// src/transport/memory/mod.rs

//! In-memory publish/subscribe bus.
//!
//! This module provides a pure in-process implementation of the domain-level
//! [`Publisher`](crate::Publisher) and [`Subscriber`](crate::Subscriber)
//! traits. It is intended for single-process applications, tests, and as a
//! reference for the delivery semantics other transports should approximate.
//!
//! ## Reference Semantics
//!
//! - Each published message is delivered at most once per consumer group:
//!   exactly one matching consumer of every group that has one.
//! - Which member of a group receives a given message is unspecified.
//! - A failing consume function never stops delivery to anyone else and
//!   is never retried.
//! - Cancelling one consumer affects nobody else; closing the publisher is
//!   the only way to stop the dispatch loop.
//!
//! ## Non-Goals
//!
//! - Persistence or durability across restarts
//! - Ordering across consumer groups
//! - Exactly-once delivery

mod publisher;
mod registry;
mod subscriber;

use tokio::sync::mpsc;

use crate::{log_debug, BusConfig};

pub use publisher::MemoryPublisher;
pub use subscriber::MemorySubscriber;

/// Create a publisher and the subscriber bound to its channel.
///
/// The receive end of the channel moves into the subscriber here; the
/// publisher keeps only the send end. Dropping the subscriber before any
/// consumer is started makes further blocking publishes fail with
/// [`Error::ClosedResource`](crate::Error::ClosedResource).
pub fn create_bus(config: &BusConfig) -> (MemoryPublisher, MemorySubscriber) {
    // ---
    log_debug!(
        "create memory bus: buffer_size={} block_on_full={}",
        config.buffer_size,
        config.block_on_full
    );

    let (tx, rx) = mpsc::channel(config.channel_capacity());
    (
        MemoryPublisher::new(tx, config.block_on_full),
        MemorySubscriber::new(rx),
    )
}
