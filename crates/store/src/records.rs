//! Record types moving across the store boundary.
//!
//! `*Record` structs are rows read back from a backend; `New*` structs are
//! the insert payloads. Backends assign row ids, so the two differ only in
//! the id field.

use chrono::{DateTime, Utc};
use common::{GroupId, ItemId, LineId, Money, ReceiptId};

/// A catalogue item with its current stock level.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub buying_price: Money,
    pub selling_price: Money,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

/// Insert payload for a new catalogue item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub quantity: i64,
    pub buying_price: Money,
    pub selling_price: Money,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

/// Full-replace update for a catalogue item.
///
/// Every field is written as given; `barcode: None` clears the barcode
/// rather than keeping the old one.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub name: String,
    pub quantity: i64,
    pub buying_price: Money,
    pub selling_price: Money,
    pub barcode: Option<String>,
    pub supplier_id: Option<i64>,
}

/// A committed receipt header.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub id: GroupId,
    pub public_id: ReceiptId,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub customer_name: String,
}

/// Insert payload for a receipt header.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub public_id: ReceiptId,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub customer_name: String,
}

/// A committed sale line with its price captured at sale time.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub id: LineId,
    pub group_id: GroupId,
    pub item_id: ItemId,
    pub quantity_sold: i64,
    pub total_price: Money,
}

/// Insert payload for a sale line.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub group_id: GroupId,
    pub item_id: ItemId,
    pub quantity_sold: i64,
    pub total_price: Money,
}

/// A supplier in the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierRecord {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
}

/// Insert payload for a supplier.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
}

/// A user account. `password_hash` is the argon2 hash, never the plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Insert payload for a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Outcome of a conditional quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// The adjustment applied; carries the quantity after it.
    Adjusted { new_quantity: i64 },
    /// The adjustment would have driven the quantity negative; nothing
    /// changed. Carries the quantity actually available.
    Conflict { available: i64 },
    /// The item does not exist.
    NotFound,
}

/// Half-open UTC time window `[start, end)` for receipt queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Window covering one UTC calendar day. Returns `None` for the last
    /// representable day, which has no successor to bound the window.
    pub fn for_day(day: chrono::NaiveDate) -> Option<Self> {
        use chrono::{NaiveTime, TimeZone};
        let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
        let end = Utc.from_utc_datetime(&day.succ_opt()?.and_time(NaiveTime::MIN));
        Some(Self { start, end })
    }

    /// True if `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}
