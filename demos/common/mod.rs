//! Message types shared by the demos.
//!
//! Producers and consumers agree on a type tag and a payload layout. Keep
//! these in a module (or crate) that both sides depend on.

#![allow(dead_code)]

use mom_deliver::JsonMessage;
use serde::{Deserialize, Serialize};

pub const TYPE_USER_CREATED: &str = "user.created";
pub const TYPE_ORDER_PLACED: &str = "order.placed";

/// A user signed up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCreated {
    pub username: String,
}

impl JsonMessage for UserCreated {
    const MESSAGE_TYPE: &'static str = TYPE_USER_CREATED;
}

/// An order was placed and needs processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: u64,
    pub amount_cents: u64,
}

impl JsonMessage for OrderPlaced {
    const MESSAGE_TYPE: &'static str = TYPE_ORDER_PLACED;
}
