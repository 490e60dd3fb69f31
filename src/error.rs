use std::fmt;

use thiserror::Error;

/// Reasons a [`SubscribeOptions`](crate::SubscribeOptions) value is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No consume function was supplied
    #[error("missing consumer function")]
    MissingConsumeFn,

    /// The message type filter is empty
    #[error("no message types to subscribe to")]
    NoMessageTypes,

    /// Errors are ignored but an error sink was supplied anyway
    #[error("ignore errors is on but error channel was provided")]
    UnexpectedErrorSink,

    /// Errors are reported but there is nowhere to report them
    #[error("ignore errors is off but no error channel was provided")]
    MissingErrorSink,
}

/// Errors produced while publishing or consuming messages
#[derive(Error, Debug)]
pub enum Error {
    /// Subscribe options failed validation; the consumer was never started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The publisher (or the engine it feeds) has been closed
    #[error("cannot publish to closed publisher")]
    ClosedResource,

    /// `close()` was called on a publisher that is already closed
    #[error("cannot close a closed publisher")]
    AlreadyClosed,

    /// A message payload could not be encoded or decoded
    #[error("could not get message payload: {0}")]
    Encoding(String),

    /// A consume function rejected a delivered message
    #[error("consumer error: {0}")]
    Consumer(String),

    /// Builder settings contradict each other
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),
}

impl Error {
    /// Build a [`Error::Consumer`] from any displayable value.
    ///
    /// Intended for use inside consume functions:
    ///
    /// ```
    /// # use mom_deliver::Error;
    /// let err = Error::consumer(format_args!("missing username in message: {}", "user.created"));
    /// assert_eq!(err.to_string(), "consumer error: missing username in message: user.created");
    /// ```
    pub fn consumer(reason: impl fmt::Display) -> Self {
        Error::Consumer(reason.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

/// Result type alias for publish/subscribe operations
pub type Result<T> = std::result::Result<T, Error>;
