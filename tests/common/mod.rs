// tests/common/mod.rs

#![allow(dead_code)]

use std::time::Duration;

use mom_deliver::{JsonMessage, MemorySubscriber};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};

pub const TYPE_USER_CREATED: &str = "user.created";
pub const TYPE_USER_DELETED: &str = "user.deleted";

/// Published when a user is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserCreated {
    pub username: String,
}

impl JsonMessage for UserCreated {
    const MESSAGE_TYPE: &'static str = TYPE_USER_CREATED;
}

/// Published when a user is deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDeleted {
    pub username: String,
}

impl JsonMessage for UserDeleted {
    const MESSAGE_TYPE: &'static str = TYPE_USER_DELETED;
}

pub fn init_logging() {
    // ---
    #[cfg(feature = "logging")]
    {
        use tracing_subscriber::EnvFilter;

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Wait until the subscriber holds exactly `count` registrations.
pub async fn wait_for_registrations(subscriber: &MemorySubscriber, count: usize) {
    // ---
    timeout(Duration::from_secs(2), async {
        while subscriber.registration_count() != count {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for registrations");
}
