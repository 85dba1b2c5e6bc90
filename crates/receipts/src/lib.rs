//! Read side of the retail back-office.
//!
//! [`ReceiptQueryService`] reconstructs grouped receipts from the stored
//! headers and lines, applies the optional calendar-day filter, and orders
//! results newest first. It takes no locks and never mutates; because the
//! ledger commits a receipt's group and lines as one unit, any receipt
//! visible here is complete.

mod error;
mod query;

pub use error::{ReceiptError, Result};
pub use query::{LineDetailView, ReceiptLineView, ReceiptQueryService, ReceiptView};
