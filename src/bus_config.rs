//! Configuration for the in-memory publish/subscribe bus.
//!
//! Holds no broker-specific settings. It only
//! describes the channel that connects a [`MemoryPublisher`](crate::MemoryPublisher)
//! to its [`MemorySubscriber`](crate::MemorySubscriber).

/// Channel settings for an in-memory bus.
///
/// # Example
///
/// ```
/// use mom_deliver::BusConfig;
///
/// let config = BusConfig::new()
///     .with_buffer_size(64)
///     .with_block_on_full(true);
///
/// assert_eq!(config.buffer_size, 64);
/// assert!(config.block_on_full);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    // ---
    /// Number of envelopes the channel holds before `publish()` has to wait.
    ///
    /// `0` requests an unbuffered channel. Tokio channels need at least one
    /// slot, so `0` is realised as a single-slot channel.
    pub buffer_size: usize,

    /// Whether `publish()` waits for room in the channel.
    ///
    /// - `true`: back-pressure; the caller stalls until the dispatch loop
    ///   makes room, and envelopes reach the loop in publish order.
    /// - `false`: the envelope is handed to a detached task and `publish()`
    ///   returns immediately; concurrent publishes may be reordered.
    pub block_on_full: bool,
}

impl BusConfig {
    /// Unbuffered, non-blocking configuration.
    pub fn new() -> Self {
        Self {
            buffer_size: 0,
            block_on_full: false,
        }
    }

    /// Set the channel capacity.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set whether `publish()` applies back-pressure.
    pub fn with_block_on_full(mut self, block_on_full: bool) -> Self {
        self.block_on_full = block_on_full;
        self
    }

    /// Capacity actually handed to `tokio::sync::mpsc::channel`.
    pub(crate) fn channel_capacity(&self) -> usize {
        self.buffer_size.max(1)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_default_is_unbuffered_non_blocking() {
        // ---
        let config = BusConfig::default();
        assert_eq!(config.buffer_size, 0);
        assert!(!config.block_on_full);
        assert_eq!(config.channel_capacity(), 1);
    }

    #[test]
    fn test_capacity_follows_buffer_size() {
        // ---
        let config = BusConfig::new().with_buffer_size(32);
        assert_eq!(config.channel_capacity(), 32);
    }
}
