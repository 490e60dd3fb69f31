//! Two loggers sharing a consumer group on the in-memory bus.
//!
//! Publishes twenty `user.created` messages; every fifth one has no
//! username and is rejected by the consumer. Each message is logged by
//! exactly one of the two consumers, and rejections end up on the shared
//! error channel.
//!
//! Run with: RUST_LOG=info cargo run --example in_memory

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::panic_in_result_fn
)]

mod common;

use std::time::Duration;

use common::{UserCreated, TYPE_USER_CREATED};
use mom_deliver::{
    create_memory_bus, BusConfig, ConsumeFn, Error, Message, Publisher, Result, SubscribeOptions,
    Subscriber,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt as tracing_format, EnvFilter};

const CONSUMERS: usize = 2;
const MESSAGES: usize = 20;

fn logger(name: &'static str) -> ConsumeFn {
    // ---
    ConsumeFn::new(move |message_type, payload| async move {
        let mut user = UserCreated::default();
        user.with_payload(&payload)?;
        if user.username.is_empty() {
            return Err(Error::consumer(format_args!(
                "missing username in message: {message_type}"
            )));
        }
        tracing::info!(consumer = name, username = %user.username, "user created");
        Ok(())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_format()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_line_number(true)
        .init();

    let (publisher, subscriber) = create_memory_bus(
        &BusConfig::new()
            .with_buffer_size(8)
            .with_block_on_full(true),
    );
    let cancel = CancellationToken::new();
    let (errors_tx, mut errors_rx) = mpsc::channel::<Error>(16);

    let error_logger = tokio::spawn(async move {
        while let Some(err) = errors_rx.recv().await {
            tracing::error!("{err}");
        }
    });

    let mut consumers = Vec::with_capacity(CONSUMERS);
    for name in ["logger-a", "logger-b"] {
        let subscriber = subscriber.clone();
        let cancel = cancel.clone();
        let options = SubscribeOptions::new(logger(name))
            .group("message-logger")
            .message_type(TYPE_USER_CREATED)
            .report_errors(errors_tx.clone());
        consumers.push(tokio::spawn(async move {
            subscriber.subscribe(cancel, options).await
        }));
    }
    // the consumers hold the remaining senders
    drop(errors_tx);

    while subscriber.registration_count() < CONSUMERS {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    for i in 0..MESSAGES {
        let username = if i % 5 == 4 {
            String::new()
        } else {
            format!("user-{i}")
        };
        publisher.publish(&UserCreated { username }).await?;
    }

    // give the loop time to drain before shutting down
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    for consumer in consumers {
        consumer.await.expect("consumer task panicked")?;
    }
    publisher.close().await?;
    error_logger.await.expect("error logger panicked");

    Ok(())
}
