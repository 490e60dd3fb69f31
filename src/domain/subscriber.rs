// src/domain/subscriber.rs

//! Subscribing side of the domain interface.
//!
//! A consumer describes what it wants with [`SubscribeOptions`] and hands
//! them to a [`Subscriber`] together with a cancellation token. The
//! subscriber validates the options, registers the consumer under its group
//! and keeps it registered until the token is cancelled.
//!
//! Messages are handled at most once per consumer group: when several
//! consumers share a group, each matching message goes to exactly one of
//! them. Consumers in different groups are independent and each group gets
//! its own copy.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, ValidationError};

/// Group used when [`SubscribeOptions::group`] is left empty.
pub const DEFAULT_GROUP: &str = "default";

/// Destination for errors returned by a consume function.
///
/// The caller chooses the capacity when creating the channel. The dispatch
/// loop waits for room when the sink is full, which stalls delivery to every
/// other consumer, so keep a receiver draining it.
pub type ErrorSink = mpsc::Sender<Error>;

type ConsumeFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Type-erased async function that handles one delivered message.
///
/// Receives the message type tag and the encoded payload exactly as they
/// were published. Cloning is cheap; all clones share the same closure.
///
/// ```
/// use mom_deliver::{ConsumeFn, Error};
///
/// let consume = ConsumeFn::new(|message_type, payload| async move {
///     if payload.is_empty() {
///         return Err(Error::consumer(format_args!("empty {message_type} message")));
///     }
///     Ok(())
/// });
/// # let _ = consume;
/// ```
#[derive(Clone)]
pub struct ConsumeFn(Arc<dyn Fn(Arc<str>, Bytes) -> ConsumeFuture + Send + Sync>);

impl ConsumeFn {
    /// Wrap an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Arc<str>, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        // ---
        Self(Arc::new(
            move |message_type: Arc<str>, payload: Bytes| -> ConsumeFuture {
                Box::pin(func(message_type, payload))
            },
        ))
    }

    /// Wrap a synchronous closure.
    ///
    /// Handy for consumers that never await; the closure runs on the
    /// dispatch task, so keep it short.
    pub fn from_sync<F>(func: F) -> Self
    where
        F: Fn(&str, &[u8]) -> Result<()> + Send + Sync + 'static,
    {
        // ---
        Self(Arc::new(
            move |message_type: Arc<str>, payload: Bytes| -> ConsumeFuture {
                Box::pin(std::future::ready(func(&message_type, &payload)))
            },
        ))
    }

    pub(crate) fn call(&self, message_type: Arc<str>, payload: Bytes) -> ConsumeFuture {
        (self.0)(message_type, payload)
    }
}

impl fmt::Debug for ConsumeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConsumeFn(..)")
    }
}

/// What happens to errors returned by a consume function.
#[derive(Clone, Debug)]
pub enum ErrorPolicy {
    /// Errors are dropped.
    Ignore,
    /// Errors are sent to the sink, once per failing invocation.
    Report(ErrorSink),
}

/// Options for one consumer started with [`Subscriber::subscribe`].
///
/// Fields can be set directly or through the fluent helpers:
///
/// ```
/// use mom_deliver::{ConsumeFn, SubscribeOptions};
/// use tokio::sync::mpsc;
///
/// let (errors_tx, _errors_rx) = mpsc::channel(16);
/// let options = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(())))
///     .group("message-logger")
///     .message_type("user.created")
///     .report_errors(errors_tx);
///
/// assert_eq!(options.group, "message-logger");
/// assert_eq!(options.types, vec!["user.created".to_string()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    // ---
    /// Function that handles the consumed messages.
    pub consume_fn: Option<ConsumeFn>,

    /// A message is only consumed once per group. Empty means [`DEFAULT_GROUP`].
    pub group: String,

    /// Message types the consume function is subscribed to.
    pub types: Vec<String>,

    /// Whether errors returned from the consume function are dropped.
    ///
    /// If this is false, `errors` must be set.
    pub ignore_errors: bool,

    /// Receives errors returned from the consume function, unless ignored.
    pub errors: Option<ErrorSink>,
}

impl SubscribeOptions {
    /// Start from a consume function; everything else is empty.
    pub fn new(consume_fn: ConsumeFn) -> Self {
        Self {
            consume_fn: Some(consume_fn),
            ..Self::default()
        }
    }

    /// Set the consumer group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Add one message type to the filter.
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.types.push(message_type.into());
        self
    }

    /// Add several message types to the filter.
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Drop consume errors.
    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self.errors = None;
        self
    }

    /// Send consume errors to `sink`.
    pub fn report_errors(mut self, sink: ErrorSink) -> Self {
        self.ignore_errors = false;
        self.errors = Some(sink);
        self
    }

    /// Make sure the options are usable and apply defaults.
    ///
    /// The only mutation is filling an empty `group` with [`DEFAULT_GROUP`],
    /// which happens even when validation then fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a missing consume function, an
    /// empty type filter, or an `ignore_errors`/`errors` mismatch.
    pub fn validate(&mut self) -> Result<()> {
        // ---
        if self.group.is_empty() {
            self.group = DEFAULT_GROUP.to_string();
        }

        let err = if self.consume_fn.is_none() {
            ValidationError::MissingConsumeFn
        } else if self.types.is_empty() {
            ValidationError::NoMessageTypes
        } else if self.ignore_errors && self.errors.is_some() {
            ValidationError::UnexpectedErrorSink
        } else if !self.ignore_errors && self.errors.is_none() {
            ValidationError::MissingErrorSink
        } else {
            return Ok(());
        };

        Err(err.into())
    }

    /// Validate and split the options into the parts a registration needs.
    pub(crate) fn resolve(mut self) -> Result<ResolvedOptions> {
        // ---
        self.validate()?;

        let consume_fn = self.consume_fn.ok_or(ValidationError::MissingConsumeFn)?;
        let error_policy = match (self.ignore_errors, self.errors) {
            (true, None) => ErrorPolicy::Ignore,
            (false, Some(sink)) => ErrorPolicy::Report(sink),
            (true, Some(_)) => return Err(ValidationError::UnexpectedErrorSink.into()),
            (false, None) => return Err(ValidationError::MissingErrorSink.into()),
        };

        Ok(ResolvedOptions {
            group: self.group,
            types: self.types.into_iter().collect(),
            consume_fn,
            error_policy,
        })
    }
}

/// Validated subscribe options.
#[derive(Debug)]
pub(crate) struct ResolvedOptions {
    pub group: String,
    pub types: HashSet<String>,
    pub consume_fn: ConsumeFn,
    pub error_policy: ErrorPolicy,
}

/// Subscriber abstraction.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. Treat the method as a normal
/// `async fn`.
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    // ---
    /// Start a consumer and keep it running until `cancel` is cancelled.
    ///
    /// This call blocks for the whole life of the consumer. If an error is
    /// returned the consumer was never started; otherwise consume errors are
    /// only observable through [`SubscribeOptions::errors`].
    ///
    /// Dropping the returned future also stops the consumer.
    async fn subscribe(&self, cancel: CancellationToken, options: SubscribeOptions) -> Result<()>;
}

/// Shared subscriber pointer.
pub type SubscriberPtr = Arc<dyn Subscriber>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn noop() -> ConsumeFn {
        ConsumeFn::from_sync(|_, _| Ok(()))
    }

    fn assert_rejected(mut options: SubscribeOptions, expected: ValidationError) {
        // ---
        match options.validate() {
            Err(Error::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_with_missing_group() {
        // ---
        let mut options = SubscribeOptions::new(noop())
            .message_type("test")
            .ignore_errors();

        options.validate().expect("options are valid");
        assert_eq!(options.group, DEFAULT_GROUP);
    }

    #[test]
    fn test_explicit_group_is_kept() {
        // ---
        let mut options = SubscribeOptions::new(noop())
            .group("billing")
            .message_type("test")
            .ignore_errors();

        options.validate().expect("options are valid");
        assert_eq!(options.group, "billing");
    }

    #[test]
    fn test_missing_consume_fn() {
        // ---
        let options = SubscribeOptions {
            types: vec!["test".into()],
            ignore_errors: true,
            ..SubscribeOptions::default()
        };
        assert_rejected(options, ValidationError::MissingConsumeFn);
    }

    #[test]
    fn test_missing_types() {
        // ---
        let options = SubscribeOptions::new(noop()).ignore_errors();
        assert_rejected(options, ValidationError::NoMessageTypes);
    }

    #[test]
    fn test_sink_given_while_ignoring() {
        // ---
        let (tx, _rx) = mpsc::channel(1);
        let options = SubscribeOptions {
            consume_fn: Some(noop()),
            types: vec!["test".into()],
            ignore_errors: true,
            errors: Some(tx),
            ..SubscribeOptions::default()
        };
        assert_rejected(options, ValidationError::UnexpectedErrorSink);
    }

    #[test]
    fn test_missing_sink() {
        // ---
        let options = SubscribeOptions::new(noop()).message_type("test");
        assert_rejected(options, ValidationError::MissingErrorSink);
    }

    #[test]
    fn test_resolve_builds_policy() {
        // ---
        let (tx, _rx) = mpsc::channel(1);
        let resolved = SubscribeOptions::new(noop())
            .types(["a", "b", "a"])
            .report_errors(tx)
            .resolve()
            .expect("options are valid");

        assert_eq!(resolved.group, DEFAULT_GROUP);
        assert_eq!(resolved.types.len(), 2);
        assert!(matches!(resolved.error_policy, ErrorPolicy::Report(_)));
    }

    #[tokio::test]
    async fn test_consume_fn_passes_arguments_through() {
        // ---
        let consume = ConsumeFn::new(|message_type, payload| async move {
            if &*message_type == "user.created" && payload.as_ref() == b"{}" {
                Ok(())
            } else {
                Err(Error::consumer("unexpected arguments"))
            }
        });

        consume
            .call(Arc::from("user.created"), Bytes::from_static(b"{}"))
            .await
            .expect("arguments are forwarded unchanged");
        assert!(consume
            .call(Arc::from("other"), Bytes::new())
            .await
            .is_err());
    }
}
