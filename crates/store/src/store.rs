use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{GroupId, ItemId, LineId, Money};

use crate::records::{
    AdjustOutcome, DateWindow, GroupRecord, ItemRecord, ItemUpdate, LineRecord, NewGroup, NewItem,
    NewLine, NewSupplier, NewUser, SupplierRecord, UserRecord,
};
use crate::Result;

/// Core trait for retail back-office storage backends.
///
/// All implementations must be thread-safe (Send + Sync). Each method is
/// one storage round trip; the backend guarantees the atomicity of the
/// individual call only. Multi-call atomicity (a receipt's group, lines,
/// and decrements) is the ledger's job, built on these primitives plus
/// compensation.
#[async_trait]
pub trait RetailStore: Send + Sync {
    // -- Items --

    /// Inserts a catalogue item and returns it with its assigned id.
    async fn insert_item(&self, item: NewItem) -> Result<ItemRecord>;

    /// Fetches one item by id. Returns None if it does not exist.
    async fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Lists all items, ordered by id ascending.
    async fn list_items(&self) -> Result<Vec<ItemRecord>>;

    /// Fetches the items with the given ids; missing ids are skipped.
    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>>;

    /// Looks an item up by its barcode.
    async fn find_item_by_barcode(&self, barcode: &str) -> Result<Option<ItemRecord>>;

    /// Replaces every attribute of an item. Returns the updated record, or
    /// None if the item does not exist.
    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Option<ItemRecord>>;

    /// Deletes an item. Returns false if it did not exist. Sale lines that
    /// reference the item are left in place; the read side resolves their
    /// item name as absent.
    async fn delete_item(&self, id: ItemId) -> Result<bool>;

    /// Conditionally adjusts an item's quantity by `delta` (negative for a
    /// sale decrement, positive to restore).
    ///
    /// The adjustment applies only if the resulting quantity stays
    /// non-negative; otherwise nothing changes and the outcome carries the
    /// quantity actually available. The read-check-write is atomic per
    /// item within the backend, so concurrent callers cannot interleave
    /// between the check and the write.
    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> Result<AdjustOutcome>;

    // -- Receipts (groups and lines) --

    /// Inserts a receipt header and returns it with its assigned row id.
    async fn insert_group(&self, group: NewGroup) -> Result<GroupRecord>;

    /// Fetches one receipt header by row id.
    async fn get_group(&self, id: GroupId) -> Result<Option<GroupRecord>>;

    /// Lists receipt headers, newest first (creation timestamp descending,
    /// ties broken by row id descending). `window` restricts the result to
    /// groups created inside the half-open window.
    async fn list_groups(&self, window: Option<DateWindow>) -> Result<Vec<GroupRecord>>;

    /// Deletes a receipt header. Returns false if it did not exist. Used
    /// by the ledger's rollback path only.
    async fn delete_group(&self, id: GroupId) -> Result<bool>;

    /// Inserts a sale line and returns it with its assigned id.
    async fn insert_line(&self, line: NewLine) -> Result<LineRecord>;

    /// Fetches one sale line by id.
    async fn get_line(&self, id: LineId) -> Result<Option<LineRecord>>;

    /// Lists the lines belonging to the given groups, ordered by row id
    /// ascending (insertion order within a receipt).
    async fn lines_for_groups(&self, group_ids: &[GroupId]) -> Result<Vec<LineRecord>>;

    /// Deletes a sale line. Returns false if it did not exist. Never
    /// touches the item's quantity.
    async fn delete_line(&self, id: LineId) -> Result<bool>;

    // -- Suppliers --

    /// Inserts a supplier and returns it with its assigned id.
    async fn insert_supplier(&self, supplier: NewSupplier) -> Result<SupplierRecord>;

    /// Lists all suppliers, ordered by id ascending.
    async fn list_suppliers(&self) -> Result<Vec<SupplierRecord>>;

    /// Looks a supplier up by exact name.
    async fn find_supplier_by_name(&self, name: &str) -> Result<Option<SupplierRecord>>;

    // -- Users --

    /// Inserts a user account and returns it with its assigned id.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    /// Looks a user up by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    // -- Aggregates --

    /// Sum of all item quantities currently in stock.
    async fn total_stock(&self) -> Result<i64>;

    /// Sum of line totals for receipts created inside `[start, end)`.
    async fn sales_total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Money>;
}
