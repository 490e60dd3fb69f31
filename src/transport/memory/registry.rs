// src/transport/memory/registry.rs

//! Consumer registry of the in-memory subscriber.
//!
//! Maps group name → registration id → registration. A group without
//! registrations is removed, so "empty group" and "absent group" are the
//! same thing: messages for it are simply not delivered.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;

use crate::domain::{Envelope, ResolvedOptions};
use crate::{log_debug, log_warn, ConsumeFn, Error, ErrorPolicy, RegistrationId};

/// One consumer started by `subscribe()`.
pub(crate) struct Registration {
    // ---
    pub id: RegistrationId,
    pub group: String,
    types: HashSet<String>,
    consume_fn: ConsumeFn,
    error_policy: ErrorPolicy,

    // Cleared on deregistration. Only read while `in_flight` is held, so
    // once `deactivate()` has taken the gate no consume call can start.
    active: AtomicBool,

    // Held while the consume function runs, not while reporting its error.
    in_flight: Mutex<()>,
}

impl Registration {
    pub fn new(options: ResolvedOptions) -> Self {
        // ---
        Self {
            id: RegistrationId::generate(),
            group: options.group,
            types: options.types,
            consume_fn: options.consume_fn,
            error_policy: options.error_policy,
            active: AtomicBool::new(true),
            in_flight: Mutex::new(()),
        }
    }

    /// True if this registration subscribed to `message_type`.
    pub fn handles(&self, message_type: &str) -> bool {
        self.types.contains(message_type)
    }

    /// Run the consume function for one envelope.
    ///
    /// Returns `false` without calling anything if the registration was
    /// deactivated, so the caller can pick another member of the group.
    /// Consume errors (and panics) go to the error sink or are dropped,
    /// depending on the registration's policy; they never propagate.
    ///
    /// The error is reported after the gate is released, so a full error
    /// sink stalls the dispatch loop but never blocks `deactivate()`.
    pub async fn deliver(&self, envelope: &Envelope) -> bool {
        // ---
        let result = {
            let _gate = self.in_flight.lock().await;
            if !self.active.load(Ordering::Acquire) {
                return false;
            }

            // The call itself sits inside the future so a panic while
            // building the consume future is caught as well.
            let consume = async {
                self.consume_fn
                    .call(Arc::clone(&envelope.message_type), envelope.payload.clone())
                    .await
            };

            match AssertUnwindSafe(consume).catch_unwind().await {
                Ok(result) => result,
                Err(_panic) => Err(Error::consumer(format_args!(
                    "consume function panicked while handling {}",
                    envelope.message_type
                ))),
            }
        };

        if let Err(err) = result {
            self.report(err).await;
        }
        true
    }

    async fn report(&self, err: Error) {
        // ---
        match &self.error_policy {
            ErrorPolicy::Ignore => {
                log_debug!("{}/{}: ignored consume error: {err}", self.group, self.id);
            }
            ErrorPolicy::Report(sink) => {
                log_debug!("{}/{}: reporting consume error: {err}", self.group, self.id);
                if let Err(unsent) = sink.send(err).await {
                    log_warn!(
                        "{}/{}: error sink closed, dropped: {}",
                        self.group,
                        self.id,
                        unsent.0
                    );
                }
            }
        }
    }

    /// Stop new deliveries without waiting. A consume call already running
    /// is left to finish.
    pub fn retire(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Stop further deliveries, waiting for an in-flight one to finish.
    pub async fn deactivate(&self) {
        // ---
        self.retire();
        let _gate = self.in_flight.lock().await;
    }
}

/// Live registrations, grouped by consumer group.
#[derive(Default)]
pub(crate) struct Registry {
    groups: HashMap<String, HashMap<RegistrationId, Arc<Registration>>>,
}

impl Registry {
    pub fn insert(&mut self, registration: Arc<Registration>) {
        // ---
        self.groups
            .entry(registration.group.clone())
            .or_default()
            .insert(registration.id.clone(), registration);
    }

    /// Remove one registration; other members of its group are untouched.
    pub fn remove(&mut self, group: &str, id: &RegistrationId) -> Option<Arc<Registration>> {
        // ---
        let members = self.groups.get_mut(group)?;
        let removed = members.remove(id);
        if members.is_empty() {
            self.groups.remove(group);
        }
        removed
    }

    /// Matching registrations for `message_type`, one list per group.
    ///
    /// Groups without a match are left out. Order inside a list is the
    /// map's iteration order and carries no meaning.
    pub fn candidates(&self, message_type: &str) -> Vec<Vec<Arc<Registration>>> {
        // ---
        self.groups
            .values()
            .map(|members| {
                members
                    .values()
                    .filter(|registration| registration.handles(message_type))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|matching| !matching.is_empty())
            .collect()
    }

    /// Number of live registrations across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(HashMap::len).sum()
    }

    /// Number of groups with at least one live registration.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
