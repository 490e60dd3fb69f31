// src/domain/publisher.rs

//! Publishing side of the domain interface.

use std::sync::Arc;

use crate::{Message, Result};

/// Publisher abstraction.
///
/// A `Publisher` accepts typed messages and makes them available to
/// subscribers. The in-memory publisher feeds a
/// [`MemorySubscriber`](crate::MemorySubscriber); a broker-backed publisher
/// would satisfy the same contract against its own transport.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. Treat the methods as normal
/// `async fn`s.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    // ---
    /// Publish the given message.
    ///
    /// If an error is returned, the message has not been published.
    ///
    /// # Errors
    ///
    /// - [`Error::ClosedResource`](crate::Error::ClosedResource) after `close()`
    /// - [`Error::Encoding`](crate::Error::Encoding) if the payload cannot be produced
    async fn publish(&self, message: &dyn Message) -> Result<()>;

    /// Close the publisher and release any associated resources.
    ///
    /// # Errors
    ///
    /// Implementations with a lifecycle return
    /// [`Error::AlreadyClosed`](crate::Error::AlreadyClosed) on a second call.
    async fn close(&self) -> Result<()>;
}

/// Shared publisher pointer.
///
/// `.clone()` only bumps a reference count; all clones publish through the
/// same underlying channel or connection.
pub type PublisherPtr = Arc<dyn Publisher>;
