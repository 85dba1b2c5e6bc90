//! Write side of the retail back-office: the grouped sale transaction
//! engine.
//!
//! A sale enters through [`LedgerService::record_sale`] and flows through
//! two phases. The [`StockReconciler`] first checks and prices every
//! requested line against current inventory without mutating anything;
//! only if the whole receipt is feasible does the ledger commit, under an
//! explicit [`UnitOfWork`] that records a compensating action for each
//! mutation and replays them in reverse on any failure. The result is
//! all-or-nothing semantics across the receipt: stock never goes negative
//! and no partially applied receipt is ever observable.

mod error;
mod reconcile;
mod service;
mod unit_of_work;

pub use error::{LedgerError, Result};
pub use reconcile::{PricedLine, SaleLine, StockReconciler};
pub use service::{LedgerService, Receipt, ReceiptLine, SaleRequest};
pub use unit_of_work::UnitOfWork;
