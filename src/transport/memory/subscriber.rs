// src/transport/memory/subscriber.rs

//! In-memory subscriber: the distribution engine.
//!
//! Owns the consumer registry and the single dispatch loop that drains the
//! bus channel. For every envelope the loop delivers to at most one matching
//! consumer in every group.
//!
//! ## Locking
//!
//! - The registry lock is only held to insert, remove, or snapshot the
//!   matching registrations of an envelope. Consume functions run after it
//!   is released, so a slow consumer never blocks `subscribe()` or
//!   deregistration of other consumers.
//! - Each registration has its own async gate. A delivery holds it for the
//!   duration of the consume function (not while reporting the error);
//!   deregistration marks the registration inactive and then takes the gate.
//!   After `subscribe()` returns, its consume function is never called
//!   again. If the snapshot picked a member that was deregistered in the
//!   meantime, the next matching member of the same group is used instead.
//! - Deregistration is tied to a drop guard, so a `subscribe()` future that
//!   is dropped (timeout, `select!`, aborted task) leaves the registry as
//!   well. In that case a consume call already running is not waited for.
//! - The "loop running" state has its own lock, separate from the registry.
//!
//! ## Head-of-line blocking
//!
//! Deliveries are sequential: an envelope reaches every matched group
//! before the next envelope is taken. A consume function that never
//! returns, or an error sink that is never drained, stalls the whole bus.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::transport::lock_ignore_poison;
use super::registry::{Registration, Registry};
use crate::domain::Envelope;
use crate::{log_debug, Error, Result, SubscribeOptions, Subscriber};

/// Subscriber half of an in-memory bus.
///
/// Cheap to clone; clones share the registry and the dispatch loop, which
/// is how several tasks run consumers against the same bus.
#[derive(Clone)]
pub struct MemorySubscriber {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Mutex<Registry>,
    dispatch: Mutex<DispatchState>,
}

struct DispatchState {
    // Taken by the dispatch loop when it starts; never put back, since the
    // loop only ends once the channel is closed and drained.
    source: Option<mpsc::Receiver<Envelope>>,
    running: bool,
}

impl MemorySubscriber {
    pub(crate) fn new(source: mpsc::Receiver<Envelope>) -> Self {
        // ---
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                dispatch: Mutex::new(DispatchState {
                    source: Some(source),
                    running: false,
                }),
            }),
        }
    }

    /// Number of live registrations across all groups.
    pub fn registration_count(&self) -> usize {
        lock_ignore_poison(&self.inner.registry).len()
    }

    /// Number of groups with at least one live registration.
    pub fn group_count(&self) -> usize {
        lock_ignore_poison(&self.inner.registry).group_count()
    }

    /// Whether the dispatch loop is currently running.
    pub fn is_dispatching(&self) -> bool {
        lock_ignore_poison(&self.inner.dispatch).running
    }

    /// Start the dispatch loop unless it already runs.
    ///
    /// Fails with [`Error::ClosedResource`] once the loop has drained a
    /// closed publisher; the engine cannot be restarted.
    fn ensure_dispatching(&self) -> Result<()> {
        // ---
        let source = {
            let mut state = lock_ignore_poison(&self.inner.dispatch);
            if state.running {
                return Ok(());
            }
            let source = state.source.take().ok_or(Error::ClosedResource)?;
            state.running = true;
            source
        };

        tokio::spawn(Arc::clone(&self.inner).dispatch(source));
        Ok(())
    }
}

impl Inner {
    async fn dispatch(self: Arc<Self>, mut source: mpsc::Receiver<Envelope>) {
        // ---
        log_debug!("dispatch loop started");

        while let Some(envelope) = source.recv().await {
            let groups = lock_ignore_poison(&self.registry).candidates(&envelope.message_type);
            deliver_once_per_group(groups, &envelope).await;
        }

        lock_ignore_poison(&self.dispatch).running = false;
        log_debug!("dispatch loop stopped: publisher closed and drained");
    }
}

/// Deliver to the first live member of every group; returns how many
/// groups got the envelope.
async fn deliver_once_per_group(groups: Vec<Vec<Arc<Registration>>>, envelope: &Envelope) -> usize {
    // ---
    let mut delivered = 0;
    for members in groups {
        for registration in members {
            if registration.deliver(envelope).await {
                delivered += 1;
                break;
            }
        }
    }
    delivered
}

/// Keeps a registration in the registry for as long as it lives.
struct Membership {
    inner: Arc<Inner>,
    registration: Arc<Registration>,
}

impl Membership {
    fn join(inner: Arc<Inner>, registration: Arc<Registration>) -> Self {
        // ---
        lock_ignore_poison(&inner.registry).insert(Arc::clone(&registration));
        log_debug!(
            "{}/{}: registered consumer",
            registration.group,
            registration.id
        );
        Self {
            inner,
            registration,
        }
    }

    /// Deregister and wait for a consume call that is still running.
    async fn leave(self) {
        // ---
        let registration = Arc::clone(&self.registration);
        drop(self);
        registration.deactivate().await;
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        // ---
        let registration = &self.registration;
        lock_ignore_poison(&self.inner.registry).remove(&registration.group, &registration.id);
        registration.retire();
        log_debug!(
            "{}/{}: deregistered consumer",
            registration.group,
            registration.id
        );
    }
}

#[async_trait::async_trait]
impl Subscriber for MemorySubscriber {
    // ---
    async fn subscribe(&self, cancel: CancellationToken, options: SubscribeOptions) -> Result<()> {
        // ---
        let options = options.resolve()?;
        self.ensure_dispatching()?;

        let registration = Arc::new(Registration::new(options));
        let membership = Membership::join(Arc::clone(&self.inner), registration);

        cancel.cancelled().await;
        membership.leave().await;

        Ok(())
    }
}
