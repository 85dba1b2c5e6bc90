use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a catalogue item.
///
/// Wraps the item's integer row id to provide type safety and prevent
/// mixing up item ids with group or line ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Creates an item ID from a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying row id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Unique identifier for a transaction group's internal row.
///
/// Distinct from [`ReceiptId`], which is the server-generated public
/// identifier printed on the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
    /// Creates a group ID from a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying row id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<GroupId> for i64 {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

/// Unique identifier for a single sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(i64);

impl LineId {
    /// Creates a line ID from a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying row id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LineId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<LineId> for i64 {
    fn from(id: LineId) -> Self {
        id.0
    }
}

/// Public identifier of a receipt.
///
/// Server-generated at commit time, globally unique, never reused. This
/// is the id handed to clients; the internal [`GroupId`] row id never
/// leaves the store layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(Uuid);

impl ReceiptId {
    /// Generates a fresh random receipt ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a receipt ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReceiptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReceiptId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ReceiptId> for Uuid {
    fn from(id: ReceiptId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ReceiptId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
