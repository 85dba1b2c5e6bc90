use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{GroupId, ItemId, LineId, Money, ReceiptId};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;

use crate::records::{
    AdjustOutcome, DateWindow, GroupRecord, ItemRecord, ItemUpdate, LineRecord, NewGroup, NewItem,
    NewLine, NewSupplier, NewUser, SupplierRecord, UserRecord,
};
use crate::store::RetailStore;
use crate::{Result, StoreError};

/// SQLite-backed store implementation.
///
/// Uses the runtime query API throughout; schema lives in the embedded
/// migrations and is applied on connect.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and runs pending
    /// migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let in_memory = url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Pooled in-memory connections would each open a distinct blank
        // database, so memory URLs get exactly one connection that never
        // retires.
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(Duration::from_secs(5));
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::info!(in_memory, "sqlite store connected, migrations applied");

        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_item(row: SqliteRow) -> Result<ItemRecord> {
        Ok(ItemRecord {
            id: ItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            buying_price: Money::from_cents(row.try_get("buying_price_cents")?),
            selling_price: Money::from_cents(row.try_get("selling_price_cents")?),
            barcode: row.try_get("barcode")?,
            supplier_id: row.try_get("supplier_id")?,
        })
    }

    fn row_to_group(row: SqliteRow) -> Result<GroupRecord> {
        let public_id: String = row.try_get("public_id")?;
        let public_id = public_id
            .parse::<ReceiptId>()
            .map_err(|e| StoreError::Backend(format!("malformed receipt id in store: {e}")))?;

        Ok(GroupRecord {
            id: GroupId::new(row.try_get("id")?),
            public_id,
            date: row.try_get("date")?,
            payment_method: row.try_get("payment_method")?,
            customer_name: row.try_get("customer_name")?,
        })
    }

    fn row_to_line(row: SqliteRow) -> Result<LineRecord> {
        Ok(LineRecord {
            id: LineId::new(row.try_get("id")?),
            group_id: GroupId::new(row.try_get("group_id")?),
            item_id: ItemId::new(row.try_get("item_id")?),
            quantity_sold: row.try_get("quantity_sold")?,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
        })
    }

    fn row_to_supplier(row: SqliteRow) -> Result<SupplierRecord> {
        Ok(SupplierRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            email: row.try_get("email")?,
        })
    }

    fn row_to_user(row: SqliteRow) -> Result<UserRecord> {
        Ok(UserRecord {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: row.try_get("role")?,
        })
    }
}

#[async_trait]
impl RetailStore for SqliteStore {
    async fn insert_item(&self, item: NewItem) -> Result<ItemRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (name, quantity, buying_price_cents, selling_price_cents, barcode, supplier_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.buying_price.cents())
        .bind(item.selling_price.cents())
        .bind(&item.barcode)
        .bind(item.supplier_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ItemRecord {
            id: ItemId::new(row.try_get("id")?),
            name: item.name,
            quantity: item.quantity,
            buying_price: item.buying_price,
            selling_price: item.selling_price,
            barcode: item.barcode,
            supplier_id: item.supplier_id,
        })
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, quantity, buying_price_cents, selling_price_cents, barcode, supplier_id
            FROM items
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn list_items(&self) -> Result<Vec<ItemRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, quantity, buying_price_cents, selling_price_cents, barcode, supplier_id
            FROM items
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<ItemRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, quantity, buying_price_cents, selling_price_cents, barcode, supplier_id \
             FROM items WHERE id IN ({placeholders}) ORDER BY id ASC"
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.as_i64());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_item_by_barcode(&self, barcode: &str) -> Result<Option<ItemRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, quantity, buying_price_cents, selling_price_cents, barcode, supplier_id
            FROM items
            WHERE barcode = ?
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Option<ItemRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?, quantity = ?, buying_price_cents = ?, selling_price_cents = ?,
                barcode = ?, supplier_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(update.quantity)
        .bind(update.buying_price.cents())
        .bind(update.selling_price.cents())
        .bind(&update.barcode)
        .bind(update.supplier_id)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_item(id).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_quantity(&self, id: ItemId, delta: i64) -> Result<AdjustOutcome> {
        // Single guarded statement: the check and the write cannot be
        // interleaved by a concurrent sale.
        let row = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity + ?
            WHERE id = ? AND quantity + ? >= 0
            RETURNING quantity
            "#,
        )
        .bind(delta)
        .bind(id.as_i64())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(AdjustOutcome::Adjusted {
                new_quantity: row.try_get("quantity")?,
            });
        }

        // The guard refused; distinguish a missing item from exhausted
        // stock. The reported availability is advisory only.
        let existing = sqlx::query("SELECT quantity FROM items WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            Some(row) => Ok(AdjustOutcome::Conflict {
                available: row.try_get("quantity")?,
            }),
            None => Ok(AdjustOutcome::NotFound),
        }
    }

    async fn insert_group(&self, group: NewGroup) -> Result<GroupRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO transaction_groups (public_id, date, payment_method, customer_name)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(group.public_id.to_string())
        .bind(group.date)
        .bind(&group.payment_method)
        .bind(&group.customer_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(GroupRecord {
            id: GroupId::new(row.try_get("id")?),
            public_id: group.public_id,
            date: group.date,
            payment_method: group.payment_method,
            customer_name: group.customer_name,
        })
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<GroupRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, public_id, date, payment_method, customer_name
            FROM transaction_groups
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_group).transpose()
    }

    async fn list_groups(&self, window: Option<DateWindow>) -> Result<Vec<GroupRecord>> {
        let rows = match window {
            Some(w) => {
                sqlx::query(
                    r#"
                    SELECT id, public_id, date, payment_method, customer_name
                    FROM transaction_groups
                    WHERE date >= ? AND date < ?
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .bind(w.start)
                .bind(w.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, public_id, date, payment_method, customer_name
                    FROM transaction_groups
                    ORDER BY date DESC, id DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Self::row_to_group).collect()
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transaction_groups WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_line(&self, line: NewLine) -> Result<LineRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (group_id, item_id, quantity_sold, total_price_cents)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(line.group_id.as_i64())
        .bind(line.item_id.as_i64())
        .bind(line.quantity_sold)
        .bind(line.total_price.cents())
        .fetch_one(&self.pool)
        .await?;

        Ok(LineRecord {
            id: LineId::new(row.try_get("id")?),
            group_id: line.group_id,
            item_id: line.item_id,
            quantity_sold: line.quantity_sold,
            total_price: line.total_price,
        })
    }

    async fn get_line(&self, id: LineId) -> Result<Option<LineRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, item_id, quantity_sold, total_price_cents
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_line).transpose()
    }

    async fn lines_for_groups(&self, group_ids: &[GroupId]) -> Result<Vec<LineRecord>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; group_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, group_id, item_id, quantity_sold, total_price_cents \
             FROM transactions WHERE group_id IN ({placeholders}) ORDER BY id ASC"
        );

        let mut query = sqlx::query(&sql);
        for id in group_ids {
            query = query.bind(id.as_i64());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn delete_line(&self, id: LineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_supplier(&self, supplier: NewSupplier) -> Result<SupplierRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO suppliers (name, contact, email)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(SupplierRecord {
            id: row.try_get("id")?,
            name: supplier.name,
            contact: supplier.contact,
            email: supplier.email,
        })
    }

    async fn list_suppliers(&self) -> Result<Vec<SupplierRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, contact, email
            FROM suppliers
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_supplier).collect()
    }

    async fn find_supplier_by_name(&self, name: &str) -> Result<Option<SupplierRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, contact, email
            FROM suppliers
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_supplier).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserRecord {
            id: row.try_get("id")?,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn total_stock(&self) -> Result<i64> {
        let total: Option<i64> = sqlx::query_scalar("SELECT SUM(quantity) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.unwrap_or(0))
    }

    async fn sales_total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(t.total_price_cents)
            FROM transactions t
            JOIN transaction_groups g ON g.id = t.group_id
            WHERE g.date >= ? AND g.date < ?
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }
}
