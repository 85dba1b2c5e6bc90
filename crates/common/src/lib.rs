//! Shared types for the retail back-office.
//!
//! Identifier newtypes keep item, receipt, and line ids from being mixed
//! up at call sites; [`Money`] holds amounts in integer cents.

mod money;
mod types;

pub use money::Money;
pub use types::{GroupId, ItemId, LineId, ReceiptId};
