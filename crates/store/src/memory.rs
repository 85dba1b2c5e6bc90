use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{GroupId, ItemId, LineId, Money};
use tokio::sync::RwLock;

use crate::records::{
    AdjustOutcome, DateWindow, GroupRecord, ItemRecord, ItemUpdate, LineRecord, NewGroup, NewItem,
    NewLine, NewSupplier, NewUser, SupplierRecord, UserRecord,
};
use crate::store::RetailStore;
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<i64, ItemRecord>,
    groups: BTreeMap<i64, GroupRecord>,
    lines: BTreeMap<i64, LineRecord>,
    suppliers: BTreeMap<i64, SupplierRecord>,
    users: BTreeMap<i64, UserRecord>,
    next_item_id: i64,
    next_group_id: i64,
    next_line_id: i64,
    next_supplier_id: i64,
    next_user_id: i64,
    fail_on_insert_line: bool,
    fail_on_insert_group: bool,
}

/// In-memory store implementation.
///
/// Backs tests and ephemeral deployments, and provides the same contract
/// as the SQLite implementation, including the unique constraints. All
/// state lives behind one async `RwLock`, so the conditional quantity
/// adjustment is atomic per call.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail line inserts until reset. Lets tests
    /// drive the ledger's rollback path deterministically.
    pub async fn set_fail_on_insert_line(&self, fail: bool) {
        self.inner.write().await.fail_on_insert_line = fail;
    }

    /// Configures the store to fail group inserts until reset.
    pub async fn set_fail_on_insert_group(&self, fail: bool) {
        self.inner.write().await.fail_on_insert_group = fail;
    }

    /// Returns the number of persisted receipt headers.
    pub async fn group_count(&self) -> usize {
        self.inner.read().await.groups.len()
    }

    /// Returns the number of persisted sale lines.
    pub async fn line_count(&self) -> usize {
        self.inner.read().await.lines.len()
    }
}

#[async_trait]
impl RetailStore for MemoryStore {
    async fn insert_item(&self, item: NewItem) -> Result<ItemRecord> {
        let mut state = self.inner.write().await;

        // Unique constraint simulation, mirroring the SQLite schema
        if let Some(ref barcode) = item.barcode
            && state
                .items
                .values()
                .any(|i| i.barcode.as_deref() == Some(barcode.as_str()))
        {
            return Err(StoreError::Backend(format!(
                "UNIQUE constraint failed: items.barcode ({barcode})"
            )));
        }

        state.next_item_id += 1;
        let record = ItemRecord {
            id: ItemId::new(state.next_item_id),
            name: item.name,
            quantity: item.quantity,
            buying_price: item.buying_price,
            selling_price: item.selling_price,
            barcode: item.barcode,
            supplier_id: item.supplier_id,
        };
        state.items.insert(record.id.as_i64(), record.clone());
        Ok(record)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let state = self.inner.read().await;
        Ok(state.items.get(&id.as_i64()).cloned())
    }

    async fn list_items(&self) -> Result<Vec<ItemRecord>> {
        let state = self.inner.read().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>> {
        let state = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.items.get(&id.as_i64()).cloned())
            .collect())
    }

    async fn find_item_by_barcode(&self, barcode: &str) -> Result<Option<ItemRecord>> {
        let state = self.inner.read().await;
        Ok(state
            .items
            .values()
            .find(|i| i.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Option<ItemRecord>> {
        let mut state = self.inner.write().await;
        let Some(item) = state.items.get_mut(&id.as_i64()) else {
            return Ok(None);
        };
        item.name = update.name;
        item.quantity = update.quantity;
        item.buying_price = update.buying_price;
        item.selling_price = update.selling_price;
        item.barcode = update.barcode;
        item.supplier_id = update.supplier_id;
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let mut state = self.inner.write().await;
        Ok(state.items.remove(&id.as_i64()).is_some())
    }

    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> Result<AdjustOutcome> {
        // One write guard spans the check and the write, making the
        // adjustment atomic with respect to concurrent sales.
        let mut state = self.inner.write().await;
        let Some(item) = state.items.get_mut(&id.as_i64()) else {
            return Ok(AdjustOutcome::NotFound);
        };

        let next = item.quantity + delta;
        if next < 0 {
            return Ok(AdjustOutcome::Conflict {
                available: item.quantity,
            });
        }
        item.quantity = next;
        Ok(AdjustOutcome::Adjusted { new_quantity: next })
    }

    async fn insert_group(&self, group: NewGroup) -> Result<GroupRecord> {
        let mut state = self.inner.write().await;

        if state.fail_on_insert_group {
            return Err(StoreError::Backend(
                "injected insert_group failure".to_string(),
            ));
        }
        if state
            .groups
            .values()
            .any(|g| g.public_id == group.public_id)
        {
            return Err(StoreError::Backend(format!(
                "UNIQUE constraint failed: transaction_groups.public_id ({})",
                group.public_id
            )));
        }

        state.next_group_id += 1;
        let record = GroupRecord {
            id: GroupId::new(state.next_group_id),
            public_id: group.public_id,
            date: group.date,
            payment_method: group.payment_method,
            customer_name: group.customer_name,
        };
        state.groups.insert(record.id.as_i64(), record.clone());
        Ok(record)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupRecord>> {
        let state = self.inner.read().await;
        Ok(state.groups.get(&id.as_i64()).cloned())
    }

    async fn list_groups(&self, window: Option<DateWindow>) -> Result<Vec<GroupRecord>> {
        let state = self.inner.read().await;
        let mut groups: Vec<_> = state
            .groups
            .values()
            .filter(|g| window.is_none_or(|w| w.contains(g.date)))
            .cloned()
            .collect();

        // Newest first; row id breaks timestamp ties so repeated reads
        // come back in the same order.
        groups.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let mut state = self.inner.write().await;
        Ok(state.groups.remove(&id.as_i64()).is_some())
    }

    async fn insert_line(&self, line: NewLine) -> Result<LineRecord> {
        let mut state = self.inner.write().await;

        if state.fail_on_insert_line {
            return Err(StoreError::Backend(
                "injected insert_line failure".to_string(),
            ));
        }

        state.next_line_id += 1;
        let record = LineRecord {
            id: LineId::new(state.next_line_id),
            group_id: line.group_id,
            item_id: line.item_id,
            quantity_sold: line.quantity_sold,
            total_price: line.total_price,
        };
        state.lines.insert(record.id.as_i64(), record.clone());
        Ok(record)
    }

    async fn get_line(&self, id: LineId) -> Result<Option<LineRecord>> {
        let state = self.inner.read().await;
        Ok(state.lines.get(&id.as_i64()).cloned())
    }

    async fn lines_for_groups(&self, group_ids: &[GroupId]) -> Result<Vec<LineRecord>> {
        let state = self.inner.read().await;
        // BTreeMap iteration is id-ascending, which is insertion order here.
        Ok(state
            .lines
            .values()
            .filter(|l| group_ids.contains(&l.group_id))
            .cloned()
            .collect())
    }

    async fn delete_line(&self, id: LineId) -> Result<bool> {
        let mut state = self.inner.write().await;
        Ok(state.lines.remove(&id.as_i64()).is_some())
    }

    async fn insert_supplier(&self, supplier: NewSupplier) -> Result<SupplierRecord> {
        let mut state = self.inner.write().await;

        if state.suppliers.values().any(|s| s.name == supplier.name) {
            return Err(StoreError::Backend(format!(
                "UNIQUE constraint failed: suppliers.name ({})",
                supplier.name
            )));
        }

        state.next_supplier_id += 1;
        let record = SupplierRecord {
            id: state.next_supplier_id,
            name: supplier.name,
            contact: supplier.contact,
            email: supplier.email,
        };
        state.suppliers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_suppliers(&self) -> Result<Vec<SupplierRecord>> {
        let state = self.inner.read().await;
        Ok(state.suppliers.values().cloned().collect())
    }

    async fn find_supplier_by_name(&self, name: &str) -> Result<Option<SupplierRecord>> {
        let state = self.inner.read().await;
        Ok(state.suppliers.values().find(|s| s.name == name).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut state = self.inner.write().await;

        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Backend(format!(
                "UNIQUE constraint failed: users.username ({})",
                user.username
            )));
        }

        state.next_user_id += 1;
        let record = UserRecord {
            id: state.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn total_stock(&self) -> Result<i64> {
        let state = self.inner.read().await;
        Ok(state.items.values().map(|i| i.quantity).sum())
    }

    async fn sales_total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Money> {
        let state = self.inner.read().await;
        let window = DateWindow { start, end };
        Ok(state
            .lines
            .values()
            .filter(|l| {
                state
                    .groups
                    .get(&l.group_id.as_i64())
                    .is_some_and(|g| window.contains(g.date))
            })
            .map(|l| l.total_price)
            .sum())
    }
}
