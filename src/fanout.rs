//! Start many identical consumers at once.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{log_warn, Error, SubscribeOptions, SubscriberPtr};

/// Start `count` consumers with the same options against one subscriber.
///
/// Every consumer runs `subscriber.subscribe(cancel, options)` on its own
/// task, so they share the group given in `options` and split its messages
/// between them. Start-up errors (e.g. invalid options) are sent to the
/// returned receiver, one per failed consumer. The receiver yields `None`
/// once every consumer has stopped, either by failing to start or because
/// `cancel` was cancelled.
///
/// The channel holds `count` errors, so consumers never wait on a slow
/// reader to report their start-up failure.
///
/// Must be called from within a Tokio runtime.
///
/// ```
/// # async fn example() -> mom_deliver::Result<()> {
/// use std::sync::Arc;
/// use mom_deliver::{create_memory_bus, subscribe_many, BusConfig, ConsumeFn, SubscribeOptions};
/// use tokio_util::sync::CancellationToken;
///
/// let (publisher, subscriber) = create_memory_bus(&BusConfig::new());
/// let cancel = CancellationToken::new();
///
/// let options = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(())))
///     .group("workers")
///     .message_type("job.created")
///     .ignore_errors();
///
/// let mut startup_errors = subscribe_many(cancel.clone(), options, Arc::new(subscriber), 4);
///
/// cancel.cancel();
/// while let Some(err) = startup_errors.recv().await {
///     eprintln!("consumer failed to start: {err}");
/// }
/// # drop(publisher);
/// # Ok(())
/// # }
/// ```
pub fn subscribe_many(
    cancel: CancellationToken,
    options: SubscribeOptions,
    subscriber: SubscriberPtr,
    count: usize,
) -> mpsc::Receiver<Error> {
    // ---
    let (tx, rx) = mpsc::channel(count.max(1));

    for index in 0..count {
        let tx = tx.clone();
        let cancel = cancel.clone();
        let options = options.clone();
        let subscriber = subscriber.clone();

        tokio::spawn(async move {
            // Blocks until the consumer stops running; the sender clone is
            // dropped with this task, which is how completion is counted.
            if let Err(err) = subscriber.subscribe(cancel, options).await {
                log_warn!("consumer {index} failed to start: {err}");
                let _ = tx.send(err).await;
            }
        });
    }

    // Only the task clones remain; the receiver closes when the last one ends.
    drop(tx);
    rx
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{create_memory_bus, BusConfig, ConsumeFn, ValidationError};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_startup_errors_are_collected() {
        // ---
        let (_publisher, subscriber) = create_memory_bus(&BusConfig::new());

        // missing error sink
        let options = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(()))).message_type("t");

        let mut errors = subscribe_many(CancellationToken::new(), options, Arc::new(subscriber), 3);

        let mut failures = 0;
        while let Some(err) = timeout(Duration::from_secs(1), errors.recv())
            .await
            .expect("timed out waiting for start-up errors")
        {
            assert!(matches!(
                err,
                Error::Validation(ValidationError::MissingErrorSink)
            ));
            failures += 1;
        }
        assert_eq!(failures, 3);
    }

    #[tokio::test]
    async fn test_channel_closes_after_cancel() {
        // ---
        let (_publisher, subscriber) = create_memory_bus(&BusConfig::new());
        let cancel = CancellationToken::new();

        let options = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(())))
            .message_type("t")
            .ignore_errors();

        let mut errors = subscribe_many(cancel.clone(), options, Arc::new(subscriber.clone()), 2);

        timeout(Duration::from_secs(1), async {
            while subscriber.registration_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("both consumers registered");

        cancel.cancel();

        let next = timeout(Duration::from_secs(1), errors.recv())
            .await
            .expect("channel must close once all consumers stopped");
        assert!(next.is_none());
        assert_eq!(subscriber.registration_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_consumers_closes_immediately() {
        // ---
        let (_publisher, subscriber) = create_memory_bus(&BusConfig::new());
        let options = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(())))
            .message_type("t")
            .ignore_errors();

        let mut errors = subscribe_many(CancellationToken::new(), options, Arc::new(subscriber), 0);
        assert!(errors.recv().await.is_none());
    }
}
