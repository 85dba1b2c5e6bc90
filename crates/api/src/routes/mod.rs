//! Route handlers, one module per resource.

pub mod health;
pub mod items;
pub mod metrics;
pub mod stats;
pub mod suppliers;
pub mod transactions;
pub mod users;
