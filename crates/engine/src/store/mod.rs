//! Storage abstraction.
//!
//! The engine talks to one relational store through an object-safe
//! transaction interface. Implementations must guarantee that rows returned
//! by the `*_for_update` methods stay exclusively held until the transaction
//! commits or rolls back; that is the entire basis of the engine's
//! concurrency correctness.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use curio_catalog::Item;
use curio_core::{ItemId, OrderId, UserId};
use curio_orders::{Order, OrderStatus};
use curio_reservations::{AbuseRecord, Hold};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Store-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend failure (connectivity, corrupt row, constraint).
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization failure, deadlock, or lock timeout. The whole
    /// transaction may be retried from scratch; nothing was committed.
    #[error("transaction conflict: {0}")]
    Conflict(String),
}

/// Which expired holds a sweep targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepScope {
    /// All expired holds (scheduled sweep).
    Global,
    /// Only one item's expired holds (lazy sweep before a hold attempt).
    Item(ItemId),
}

/// One transaction against the store.
///
/// Dropping a transaction without calling [`StoreTx::commit`] rolls it back.
#[async_trait]
pub trait StoreTx: Send {
    /// Load an item without locking it (informational reads).
    async fn fetch_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Load an item with an exclusive row lock held until commit/rollback.
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError>;

    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError>;

    /// Holds on this item with `expires_at >= now`.
    async fn active_holds_for_item(
        &mut self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError>;

    async fn insert_hold(&mut self, hold: &Hold) -> Result<(), StoreError>;

    /// Penalty-free removal of all holds for a user/item pair. Returns the
    /// number of holds removed.
    async fn delete_holds_for(
        &mut self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<u64, StoreError>;

    /// Delete every hold with `expires_at < now` in scope, returning the
    /// deleted rows. Each expired hold is returned by exactly one sweep;
    /// that is what makes failure-recording once-per-hold.
    async fn delete_expired_holds(
        &mut self,
        scope: SweepScope,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError>;

    /// Load a user's abuse row with an exclusive lock; `None` when the user
    /// has no abuse history yet.
    async fn abuse_record_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<AbuseRecord>, StoreError>;

    async fn upsert_abuse_record(&mut self, record: &AbuseRecord) -> Result<(), StoreError>;

    /// Insert an order header and all of its lines.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Handle to the backing store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}
