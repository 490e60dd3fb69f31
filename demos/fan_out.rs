//! A pool of identical workers started with `subscribe_many`.
//!
//! Four workers share the "order-processing" group, so every order is
//! handled once. An "audit" consumer in its own group sees every order as
//! well. A second pool is started with invalid options to show how
//! start-up failures surface.
//!
//! Run with: RUST_LOG=info cargo run --example fan_out

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::panic_in_result_fn
)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{OrderPlaced, TYPE_ORDER_PLACED};
use mom_deliver::{
    subscribe_many, ConsumeFn, Message, MemoryBusBuilder, Publisher, Result, SubscribeOptions,
    SubscriberPtr,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt as tracing_format, EnvFilter};

const WORKERS: usize = 4;
const ORDERS: u64 = 12;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_format()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let (publisher, subscriber) = MemoryBusBuilder::new()
        .buffer_size(16)
        .blocking()
        .build()?;
    let subscriber_ptr: SubscriberPtr = Arc::new(subscriber.clone());
    let cancel = CancellationToken::new();

    let processed = Arc::new(AtomicUsize::new(0));
    let audited = Arc::new(AtomicUsize::new(0));

    let workers = {
        let processed = Arc::clone(&processed);
        SubscribeOptions::new(ConsumeFn::from_sync(move |_, payload| {
            let mut order = OrderPlaced::default();
            order.with_payload(payload)?;
            processed.fetch_add(1, Ordering::Relaxed);
            tracing::info!(order_id = order.order_id, "order processed");
            Ok(())
        }))
        .group("order-processing")
        .message_type(TYPE_ORDER_PLACED)
        .ignore_errors()
    };
    let mut worker_errors = subscribe_many(cancel.clone(), workers, subscriber_ptr.clone(), WORKERS);

    let audit = {
        let audited = Arc::clone(&audited);
        SubscribeOptions::new(ConsumeFn::from_sync(move |_, _| {
            audited.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }))
        .group("audit")
        .message_type(TYPE_ORDER_PLACED)
        .ignore_errors()
    };
    let mut audit_errors = subscribe_many(cancel.clone(), audit, subscriber_ptr.clone(), 1);

    // no message types: every consumer of this pool fails to start
    let broken = SubscribeOptions::new(ConsumeFn::from_sync(|_, _| Ok(()))).ignore_errors();
    let mut broken_errors = subscribe_many(cancel.clone(), broken, subscriber_ptr, 2);
    while let Some(err) = broken_errors.recv().await {
        tracing::warn!("consumer failed to start: {err}");
    }

    while subscriber.registration_count() < WORKERS + 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    for order_id in 0..ORDERS {
        publisher
            .publish(&OrderPlaced {
                order_id,
                amount_cents: 1_000 + order_id * 250,
            })
            .await?;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    while worker_errors.recv().await.is_some() {}
    while audit_errors.recv().await.is_some() {}
    publisher.close().await?;

    println!(
        "processed {} orders, audited {}",
        processed.load(Ordering::Relaxed),
        audited.load(Ordering::Relaxed)
    );
    Ok(())
}
