//! Bus builder for creating in-memory publisher/subscriber pairs.
//!
//! Provides a fluent builder API on top of [`BusConfig`], with sugar methods
//! for the two publish policies.

use crate::{BusConfig, Error, MemoryPublisher, MemorySubscriber, Result};

/// Builder for an in-memory bus.
///
/// `build()` returns the publisher together with the subscriber bound to
/// its channel; the receive end of the channel moves into the subscriber.
///
/// # Examples
///
/// ## Back-pressured bus
/// ```
/// use mom_deliver::MemoryBusBuilder;
///
/// # fn example() -> mom_deliver::Result<()> {
/// let (publisher, subscriber) = MemoryBusBuilder::new()
///     .buffer_size(128)
///     .blocking()
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// ## Fire-and-forget bus
/// ```
/// use mom_deliver::MemoryBusBuilder;
///
/// # fn example() -> mom_deliver::Result<()> {
/// let (publisher, subscriber) = MemoryBusBuilder::new()
///     .non_blocking()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct MemoryBusBuilder {
    buffer_size: Option<usize>,
    block_on_full: Option<bool>,

    // Track which sugar methods were called (conflicts detected at build())
    called_blocking: bool,
    called_non_blocking: bool,
}

impl MemoryBusBuilder {
    /// Create a new bus builder.
    pub fn new() -> Self {
        Self {
            buffer_size: None,
            block_on_full: None,
            called_blocking: false,
            called_non_blocking: false,
        }
    }

    /// Set the channel capacity. Defaults to `0` (unbuffered).
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Set the publish policy explicitly.
    ///
    /// Cannot be used together with `blocking()` / `non_blocking()`.
    pub fn block_on_full(mut self, block: bool) -> Self {
        self.block_on_full = Some(block);
        self
    }

    /// Publish with back-pressure (sugar method).
    pub fn blocking(mut self) -> Self {
        self.called_blocking = true;
        self
    }

    /// Publish through detached sends (sugar method).
    pub fn non_blocking(mut self) -> Self {
        self.called_non_blocking = true;
        self
    }

    /// Resolve the builder into a [`BusConfig`] without creating the bus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigConflict`] if:
    /// - both `blocking()` and `non_blocking()` were called
    /// - a sugar method was combined with `block_on_full()`
    pub fn config(&self) -> Result<BusConfig> {
        if self.called_blocking && self.called_non_blocking {
            return Err(Error::ConfigConflict(
                "cannot call both blocking() and non_blocking()".into(),
            ));
        }

        let called_sugar = self.called_blocking || self.called_non_blocking;
        if called_sugar && self.block_on_full.is_some() {
            return Err(Error::ConfigConflict(
                "cannot use both policy sugar methods and block_on_full()".into(),
            ));
        }

        let block_on_full = match self.block_on_full {
            Some(block) => block,
            None => self.called_blocking,
        };

        Ok(BusConfig::new()
            .with_buffer_size(self.buffer_size.unwrap_or(0))
            .with_block_on_full(block_on_full))
    }

    /// Build the publisher/subscriber pair (consumes self).
    ///
    /// # Errors
    ///
    /// See [`MemoryBusBuilder::config`].
    pub fn build(self) -> Result<(MemoryPublisher, MemorySubscriber)> {
        let config = self.config()?;
        Ok(crate::create_memory_bus(&config))
    }
}

impl Default for MemoryBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_defaults() {
        // ---
        let config = MemoryBusBuilder::new().config().expect("valid builder");
        assert_eq!(config, BusConfig::default());
    }

    #[test]
    fn test_sugar_sets_policy() {
        // ---
        let config = MemoryBusBuilder::new()
            .buffer_size(8)
            .blocking()
            .config()
            .expect("valid builder");
        assert_eq!(config.buffer_size, 8);
        assert!(config.block_on_full);
    }

    #[test]
    fn test_conflicting_sugar_rejected() {
        // ---
        let result = MemoryBusBuilder::new().blocking().non_blocking().config();
        assert!(matches!(result, Err(Error::ConfigConflict(_))));
    }

    #[test]
    fn test_sugar_and_explicit_rejected() {
        // ---
        let result = MemoryBusBuilder::new()
            .block_on_full(false)
            .blocking()
            .config();
        assert!(matches!(result, Err(Error::ConfigConflict(_))));
    }
}
