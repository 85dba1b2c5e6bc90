//! Receipt reconstruction and date filtering.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use common::{GroupId, ItemId, LineId, Money, ReceiptId};
use serde::Serialize;
use store::{DateWindow, RetailStore};

use crate::error::{ReceiptError, Result};

/// A reconstructed receipt with its lines nested underneath it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptView {
    pub transaction_id: ReceiptId,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub customer_name: String,
    pub total_price: f64,
    pub transactions: Vec<ReceiptLineView>,
}

/// One line of a reconstructed receipt.
///
/// `item_name` is `None` when the referenced item has since been deleted
/// from the catalogue; the line itself still reports its captured price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptLineView {
    pub id: LineId,
    pub item_id: ItemId,
    pub item_name: Option<String>,
    pub quantity_sold: i64,
    pub total_price: f64,
}

/// A single sale line enriched with its parent receipt's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDetailView {
    pub id: LineId,
    pub transaction_id: ReceiptId,
    pub item_id: ItemId,
    pub item_name: Option<String>,
    pub quantity_sold: i64,
    pub total_price: f64,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub customer_name: String,
}

/// Read side of the sales ledger. Never mutates; a receipt is visible here
/// only once the ledger has fully committed it.
pub struct ReceiptQueryService<S: RetailStore> {
    store: S,
}

impl<S: RetailStore> ReceiptQueryService<S> {
    /// Creates a query service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists receipts newest first, optionally restricted to one UTC
    /// calendar day given as `YYYY-MM-DD`.
    ///
    /// The filter is half-open: a receipt stamped at 23:59:59 belongs to
    /// its day, midnight belongs to the next. A malformed date fails with
    /// [`ReceiptError::InvalidDateFilter`] before any store access.
    #[tracing::instrument(skip(self))]
    pub async fn list_receipts(&self, date: Option<&str>) -> Result<Vec<ReceiptView>> {
        let window = match date {
            Some(raw) => {
                let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ReceiptError::InvalidDateFilter(raw.to_string()))?;
                // A day at the calendar's edge has no bounding window.
                let window = DateWindow::for_day(day)
                    .ok_or_else(|| ReceiptError::InvalidDateFilter(raw.to_string()))?;
                Some(window)
            }
            None => None,
        };

        let groups = self.store.list_groups(window).await?;
        let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();
        let lines = self.store.lines_for_groups(&group_ids).await?;
        let names = self.item_names(lines.iter().map(|l| l.item_id)).await?;

        // Accumulate lines per group id, then emit in the store's
        // newest-first group order. Totals are summed in cents; the
        // conversion to a decimal happens once per receipt.
        let mut lines_by_group: HashMap<GroupId, Vec<ReceiptLineView>> = HashMap::new();
        let mut totals: HashMap<GroupId, Money> = HashMap::new();
        for line in lines {
            *totals.entry(line.group_id).or_default() += line.total_price;
            lines_by_group
                .entry(line.group_id)
                .or_default()
                .push(ReceiptLineView {
                    id: line.id,
                    item_id: line.item_id,
                    item_name: names.get(&line.item_id).cloned(),
                    quantity_sold: line.quantity_sold,
                    total_price: line.total_price.as_dollars(),
                });
        }

        Ok(groups
            .into_iter()
            .map(|group| {
                let transactions = lines_by_group.remove(&group.id).unwrap_or_default();
                let total_price = totals.remove(&group.id).unwrap_or_default().as_dollars();
                ReceiptView {
                    transaction_id: group.public_id,
                    date: group.date,
                    payment_method: group.payment_method,
                    customer_name: group.customer_name,
                    total_price,
                    transactions,
                }
            })
            .collect())
    }

    /// Loads one sale line enriched with its parent receipt's metadata.
    #[tracing::instrument(skip(self))]
    pub async fn get_line(&self, id: LineId) -> Result<LineDetailView> {
        let line = self
            .store
            .get_line(id)
            .await?
            .ok_or(ReceiptError::LineNotFound(id))?;

        // An orphaned line whose group vanished is reported as absent too.
        let group = self
            .store
            .get_group(line.group_id)
            .await?
            .ok_or(ReceiptError::LineNotFound(id))?;

        let item_name = self
            .store
            .get_item(line.item_id)
            .await?
            .map(|item| item.name);

        Ok(LineDetailView {
            id: line.id,
            transaction_id: group.public_id,
            item_id: line.item_id,
            item_name,
            quantity_sold: line.quantity_sold,
            total_price: line.total_price.as_dollars(),
            date: group.date,
            payment_method: group.payment_method,
            customer_name: group.customer_name,
        })
    }

    /// Resolves current item names for the given ids; deleted items are
    /// simply missing from the map.
    async fn item_names(
        &self,
        ids: impl Iterator<Item = ItemId>,
    ) -> Result<HashMap<ItemId, String>> {
        let unique: HashSet<ItemId> = ids.collect();
        let unique: Vec<ItemId> = unique.into_iter().collect();
        let items = self.store.items_by_ids(&unique).await?;
        Ok(items.into_iter().map(|i| (i.id, i.name)).collect())
    }
}
