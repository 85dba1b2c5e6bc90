//! Persistence layer for the retail back-office.
//!
//! The [`RetailStore`] trait is the single seam between the engine and its
//! storage: the write side (ledger) and the read side (receipts) both talk
//! to it and never to a concrete backend. Two backends are provided:
//! [`MemoryStore`] for tests and ephemeral deployments, and [`SqliteStore`]
//! for durable storage.
//!
//! The one non-CRUD primitive is [`RetailStore::adjust_quantity`]: a
//! conditional stock adjustment that only applies while the resulting
//! quantity stays non-negative. Everything that must not oversell goes
//! through it.

mod error;
mod memory;
mod records;
mod sqlite;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use records::{
    AdjustOutcome, DateWindow, GroupRecord, ItemRecord, ItemUpdate, LineRecord, NewGroup, NewItem,
    NewLine, NewSupplier, NewUser, SupplierRecord, UserRecord,
};
pub use sqlite::SqliteStore;
pub use store::RetailStore;
