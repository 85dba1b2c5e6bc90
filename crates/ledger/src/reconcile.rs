//! Stock reconciliation: the read-only validate-and-price step.

use common::{ItemId, Money};
use store::RetailStore;

use crate::error::{LedgerError, Result};

/// One requested line of a sale: which item, how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub item_id: ItemId,
    pub quantity_sold: i64,
}

/// A validated line with its price snapshotted at validation time.
///
/// `total_price` is captured here and never recomputed: later catalogue
/// price edits do not change what a committed receipt charged.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity_sold: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// Checks a sale's lines against current inventory and prices them.
///
/// Purely a read: nothing is decremented here. The ledger commits only
/// after every line of the receipt has passed, and the store's conditional
/// decrement remains the authority at commit time for stock drained in
/// between.
pub struct StockReconciler<S: RetailStore> {
    store: S,
}

impl<S: RetailStore> StockReconciler<S> {
    /// Creates a reconciler over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates every line in input order and returns the priced lines.
    ///
    /// The first offending line fails the whole call: [`LedgerError::ItemNotFound`]
    /// if the item does not exist, [`LedgerError::InsufficientStock`] if the
    /// requested quantity exceeds what is available.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn validate(&self, lines: &[SaleLine]) -> Result<Vec<PricedLine>> {
        let mut priced = Vec::with_capacity(lines.len());

        for line in lines {
            let item = self
                .store
                .get_item(line.item_id)
                .await?
                .ok_or(LedgerError::ItemNotFound(line.item_id))?;

            if line.quantity_sold > item.quantity {
                return Err(LedgerError::InsufficientStock {
                    item_id: line.item_id,
                    requested: line.quantity_sold,
                    available: item.quantity,
                });
            }

            priced.push(PricedLine {
                item_id: item.id,
                item_name: item.name,
                quantity_sold: line.quantity_sold,
                unit_price: item.selling_price,
                total_price: item.selling_price.multiply(line.quantity_sold),
            });
        }

        Ok(priced)
    }
}
