//! Postgres-backed store.
//!
//! sqlx transactions carry the isolation contract: `item_for_update` and
//! `abuse_record_for_update` take `FOR UPDATE` row locks, sweeps are single
//! `DELETE … RETURNING` statements, and serialization failures, deadlocks
//! and lock timeouts all map to the retryable [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use curio_catalog::{Item, ItemStatus};
use curio_core::{HoldId, ItemId, Money, OrderId, UserId};
use curio_orders::{CustomerDetails, Order, OrderLine, OrderStatus};
use curio_reservations::{AbuseRecord, Hold};

use super::{Store, StoreError, StoreTx, SweepScope};

/// Postgres store over a shared connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with bounded pool acquisition so callers never block
    /// indefinitely on an exhausted pool.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self::new(pool))
    }

    /// Apply the checked-in schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        // Bounded lock waits: a row lock held past this surfaces as a
        // retryable conflict instead of an indefinite stall.
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn fetch_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        sqlx::query("SELECT id, name, stock, status, price_cents FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx)?
            .map(|row| item_from_row(&row))
            .transpose()
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        sqlx::query(
            "SELECT id, name, stock, status, price_cents FROM items WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(|row| item_from_row(&row))
        .transpose()
    }

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO items (id, name, stock, status, price_cents)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.stock)
        .bind(item_status_str(item.status))
        .bind(item.price.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE items SET name = $2, stock = $3, status = $4, price_cents = $5 WHERE id = $1",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.stock)
        .bind(item_status_str(item.status))
        .bind(item.price.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Storage(format!("no such item: {}", item.id)));
        }
        Ok(())
    }

    async fn active_holds_for_item(
        &mut self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        sqlx::query(
            "SELECT id, user_id, item_id, quantity, expires_at
             FROM holds
             WHERE item_id = $1 AND expires_at >= $2
             ORDER BY expires_at",
        )
        .bind(item_id.as_uuid())
        .bind(now)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .iter()
        .map(hold_from_row)
        .collect()
    }

    async fn insert_hold(&mut self, hold: &Hold) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO holds (id, user_id, item_id, quantity, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(hold.id.as_uuid())
        .bind(hold.user_id.as_uuid())
        .bind(hold.item_id.as_uuid())
        .bind(hold.quantity)
        .bind(hold.expires_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_holds_for(
        &mut self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM holds WHERE user_id = $1 AND item_id = $2")
            .bind(user_id.as_uuid())
            .bind(item_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn delete_expired_holds(
        &mut self,
        scope: SweepScope,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        // Single delete-returning statement: each expired hold is observed
        // by exactly one sweep, never read-then-deleted across round trips.
        let rows = match scope {
            SweepScope::Global => {
                sqlx::query(
                    "DELETE FROM holds WHERE expires_at < $1
                     RETURNING id, user_id, item_id, quantity, expires_at",
                )
                .bind(now)
                .fetch_all(&mut *self.tx)
                .await
            }
            SweepScope::Item(item_id) => {
                sqlx::query(
                    "DELETE FROM holds WHERE expires_at < $1 AND item_id = $2
                     RETURNING id, user_id, item_id, quantity, expires_at",
                )
                .bind(now)
                .bind(item_id.as_uuid())
                .fetch_all(&mut *self.tx)
                .await
            }
        }
        .map_err(map_sqlx)?;
        rows.iter().map(hold_from_row).collect()
    }

    async fn abuse_record_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<AbuseRecord>, StoreError> {
        sqlx::query(
            "SELECT id, failed_reservation_count, banned_until
             FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(|row| abuse_from_row(&row))
        .transpose()
    }

    async fn upsert_abuse_record(&mut self, record: &AbuseRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, failed_reservation_count, banned_until)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET
                 failed_reservation_count = EXCLUDED.failed_reservation_count,
                 banned_until = EXCLUDED.banned_until",
        )
        .bind(record.user_id.as_uuid())
        .bind(record.failed_reservation_count)
        .bind(record.banned_until)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, status, total_cents, user_id, referral_code,
                                 customer_name, customer_email, shipping_address, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id.as_uuid())
        .bind(order_status_str(order.status))
        .bind(order.total.cents())
        .bind(order.user_id.map(|u| *u.as_uuid()))
        .bind(&order.referral_code)
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.shipping_address)
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_lines (id, order_id, item_id, quantity, unit_price_cents)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::now_v7())
            .bind(order.id.as_uuid())
            .bind(line.item_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        }
        Ok(())
    }

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let header = sqlx::query(
            "SELECT id, status, total_cents, user_id, referral_code,
                    customer_name, customer_email, shipping_address, created_at
             FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query(
            "SELECT item_id, quantity, unit_price_cents
             FROM order_lines WHERE order_id = $1
             ORDER BY id",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .iter()
        .map(order_line_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(order_from_row(&header, lines)?))
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(order_status_str(status))
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Storage(format!("no such order: {id}")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        // 40001 serialization_failure, 40P01 deadlock_detected,
        // 55P03 lock_not_available.
        if matches!(db.code().as_deref(), Some("40001" | "40P01" | "55P03")) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Storage(err.to_string())
}

fn corrupt(msg: impl core::fmt::Display) -> StoreError {
    StoreError::Storage(format!("corrupt row: {msg}"))
}

fn item_status_str(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Available => "available",
        ItemStatus::Reserved => "reserved",
        ItemStatus::Sold => "sold",
    }
}

fn item_status_parse(s: &str) -> Result<ItemStatus, StoreError> {
    match s {
        "available" => Ok(ItemStatus::Available),
        "reserved" => Ok(ItemStatus::Reserved),
        "sold" => Ok(ItemStatus::Sold),
        other => Err(corrupt(format!("unknown item status {other:?}"))),
    }
}

fn order_status_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Processing => "processing",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Cancelled => "cancelled",
    }
}

fn order_status_parse(s: &str) -> Result<OrderStatus, StoreError> {
    match s {
        "pending" => Ok(OrderStatus::Pending),
        "processing" => Ok(OrderStatus::Processing),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(corrupt(format!("unknown order status {other:?}"))),
    }
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    let status: String = row.try_get("status").map_err(corrupt)?;
    Ok(Item {
        id: ItemId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        stock: row.try_get("stock").map_err(corrupt)?,
        status: item_status_parse(&status)?,
        price: Money::from_cents(row.try_get("price_cents").map_err(corrupt)?)
            .map_err(corrupt)?,
    })
}

fn hold_from_row(row: &PgRow) -> Result<Hold, StoreError> {
    Ok(Hold {
        id: HoldId::from_uuid(row.try_get("id").map_err(corrupt)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(corrupt)?),
        item_id: ItemId::from_uuid(row.try_get("item_id").map_err(corrupt)?),
        quantity: row.try_get("quantity").map_err(corrupt)?,
        expires_at: row.try_get("expires_at").map_err(corrupt)?,
    })
}

fn abuse_from_row(row: &PgRow) -> Result<AbuseRecord, StoreError> {
    Ok(AbuseRecord {
        user_id: UserId::from_uuid(row.try_get("id").map_err(corrupt)?),
        failed_reservation_count: row
            .try_get("failed_reservation_count")
            .map_err(corrupt)?,
        banned_until: row.try_get("banned_until").map_err(corrupt)?,
    })
}

fn order_line_from_row(row: &PgRow) -> Result<OrderLine, StoreError> {
    Ok(OrderLine {
        item_id: ItemId::from_uuid(row.try_get("item_id").map_err(corrupt)?),
        quantity: row.try_get("quantity").map_err(corrupt)?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents").map_err(corrupt)?)
            .map_err(corrupt)?,
    })
}

fn order_from_row(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
    let status: String = row.try_get("status").map_err(corrupt)?;
    let user_id: Option<Uuid> = row.try_get("user_id").map_err(corrupt)?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id").map_err(corrupt)?),
        status: order_status_parse(&status)?,
        total: Money::from_cents(row.try_get("total_cents").map_err(corrupt)?)
            .map_err(corrupt)?,
        user_id: user_id.map(UserId::from_uuid),
        referral_code: row.try_get("referral_code").map_err(corrupt)?,
        customer: CustomerDetails {
            name: row.try_get("customer_name").map_err(corrupt)?,
            email: row.try_get("customer_email").map_err(corrupt)?,
            shipping_address: row.try_get("shipping_address").map_err(corrupt)?,
        },
        lines,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}
