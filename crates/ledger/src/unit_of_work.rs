//! Explicit unit of work with compensating actions.

use common::{GroupId, ItemId, LineId};
use store::RetailStore;

/// A compensating action undoing one committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compensation {
    /// Re-add a decremented quantity to an item.
    RestoreQuantity { item_id: ItemId, quantity: i64 },
    /// Remove a persisted sale line.
    RemoveLine(LineId),
    /// Remove a persisted receipt header.
    RemoveGroup(GroupId),
}

/// Tracks the mutations of one `record_sale` commit so they can be undone
/// together.
///
/// Each mutation is recorded immediately after it succeeds; on any later
/// failure [`UnitOfWork::rollback`] replays the compensations in reverse
/// order, leaving the store as it was before the commit started. Backends
/// guarantee per-call atomicity only, so this list is what makes the
/// receipt atomic as a whole.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    compensations: Vec<Compensation>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful stock decrement of `quantity` units.
    pub fn record_decrement(&mut self, item_id: ItemId, quantity: i64) {
        self.compensations
            .push(Compensation::RestoreQuantity { item_id, quantity });
    }

    /// Records a successfully persisted sale line.
    pub fn record_line(&mut self, line_id: LineId) {
        self.compensations.push(Compensation::RemoveLine(line_id));
    }

    /// Records a successfully persisted receipt header.
    pub fn record_group(&mut self, group_id: GroupId) {
        self.compensations.push(Compensation::RemoveGroup(group_id));
    }

    /// Number of mutations recorded so far.
    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    /// Undoes every recorded mutation, most recent first.
    ///
    /// Compensation failures are logged and skipped rather than propagated:
    /// the original commit error is what the caller needs to see, and a
    /// partially compensated store is still better than giving up on the
    /// remaining undo steps.
    pub async fn rollback<S: RetailStore>(self, store: &S) {
        let steps = self.compensations.len();
        for compensation in self.compensations.into_iter().rev() {
            match compensation {
                Compensation::RestoreQuantity { item_id, quantity } => {
                    if let Err(e) = store.adjust_quantity(item_id, quantity).await {
                        tracing::warn!(%item_id, quantity, error = %e, "failed to restore quantity during rollback");
                    }
                }
                Compensation::RemoveLine(line_id) => {
                    if let Err(e) = store.delete_line(line_id).await {
                        tracing::warn!(%line_id, error = %e, "failed to remove line during rollback");
                    }
                }
                Compensation::RemoveGroup(group_id) => {
                    if let Err(e) = store.delete_group(group_id).await {
                        tracing::warn!(%group_id, error = %e, "failed to remove group during rollback");
                    }
                }
            }
        }
        metrics::counter!("ledger_rollbacks_total").increment(1);
        tracing::warn!(steps, "sale rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Money, ReceiptId};
    use store::{MemoryStore, NewGroup, NewItem, NewLine};

    #[tokio::test]
    async fn rollback_undoes_mutations_in_reverse() {
        let store = MemoryStore::new();
        let item = store
            .insert_item(NewItem {
                name: "A".to_string(),
                quantity: 10,
                buying_price: Money::from_cents(50),
                selling_price: Money::from_cents(100),
                barcode: None,
                supplier_id: None,
            })
            .await
            .unwrap();

        let mut uow = UnitOfWork::new();

        let group = store
            .insert_group(NewGroup {
                public_id: ReceiptId::new(),
                date: Utc::now(),
                payment_method: "cash".to_string(),
                customer_name: "N/A".to_string(),
            })
            .await
            .unwrap();
        uow.record_group(group.id);

        store.adjust_quantity(item.id, -4).await.unwrap();
        uow.record_decrement(item.id, 4);

        let line = store
            .insert_line(NewLine {
                group_id: group.id,
                item_id: item.id,
                quantity_sold: 4,
                total_price: Money::from_cents(400),
            })
            .await
            .unwrap();
        uow.record_line(line.id);

        assert_eq!(uow.len(), 3);
        uow.rollback(&store).await;

        assert_eq!(store.group_count().await, 0);
        assert_eq!(store.line_count().await, 0);
        let reloaded = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity, 10);
    }

    #[tokio::test]
    async fn empty_unit_of_work_rolls_back_to_nothing() {
        let store = MemoryStore::new();
        let uow = UnitOfWork::new();
        assert!(uow.is_empty());
        uow.rollback(&store).await;
        assert_eq!(store.group_count().await, 0);
    }
}
