//! In-memory store for tests/dev.
//!
//! A single mutex serializes all transactions, which makes every schedule
//! trivially serializable: exactly the isolation the Postgres store provides
//! through row locks, at toy scale. Each transaction mutates a working copy
//! of the state; commit writes it back, drop discards it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use curio_catalog::Item;
use curio_core::{HoldId, ItemId, OrderId, UserId};
use curio_orders::{Order, OrderStatus};
use curio_reservations::{AbuseRecord, Hold};

use super::{Store, StoreError, StoreTx, SweepScope};

#[derive(Debug, Clone, Default)]
struct State {
    items: HashMap<ItemId, Item>,
    holds: HashMap<HoldId, Hold>,
    orders: HashMap<OrderId, Order>,
    users: HashMap<UserId, AbuseRecord>,
}

/// Mutex-serialized in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hold rows currently stored (test introspection).
    pub async fn hold_count(&self) -> usize {
        self.state.lock().await.holds.len()
    }

    /// Number of order rows currently stored (test introspection).
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// A user's abuse row, if any (test introspection).
    pub async fn abuse_record(&self, user_id: UserId) -> Option<AbuseRecord> {
        self.state.lock().await.users.get(&user_id).cloned()
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    work: State,
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(InMemoryTx { guard, work }))
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn fetch_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.work.items.get(&id).cloned())
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        // The store-wide mutex already grants exclusivity.
        Ok(self.work.items.get(&id).cloned())
    }

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        if self.work.items.contains_key(&item.id) {
            return Err(StoreError::Storage(format!(
                "item already exists: {}",
                item.id
            )));
        }
        self.work.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        match self.work.items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(StoreError::Storage(format!("no such item: {}", item.id))),
        }
    }

    async fn active_holds_for_item(
        &mut self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        let mut holds: Vec<Hold> = self
            .work
            .holds
            .values()
            .filter(|h| h.item_id == item_id && h.expires_at >= now)
            .cloned()
            .collect();
        holds.sort_by_key(|h| h.expires_at);
        Ok(holds)
    }

    async fn insert_hold(&mut self, hold: &Hold) -> Result<(), StoreError> {
        self.work.holds.insert(hold.id, hold.clone());
        Ok(())
    }

    async fn delete_holds_for(
        &mut self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<u64, StoreError> {
        let before = self.work.holds.len();
        self.work
            .holds
            .retain(|_, h| !(h.user_id == user_id && h.item_id == item_id));
        Ok((before - self.work.holds.len()) as u64)
    }

    async fn delete_expired_holds(
        &mut self,
        scope: SweepScope,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        let in_scope = |h: &Hold| match scope {
            SweepScope::Global => true,
            SweepScope::Item(item_id) => h.item_id == item_id,
        };
        let mut expired = Vec::new();
        self.work.holds.retain(|_, h| {
            if h.expires_at < now && in_scope(h) {
                expired.push(h.clone());
                false
            } else {
                true
            }
        });
        expired.sort_by_key(|h| h.expires_at);
        Ok(expired)
    }

    async fn abuse_record_for_update(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<AbuseRecord>, StoreError> {
        Ok(self.work.users.get(&user_id).cloned())
    }

    async fn upsert_abuse_record(&mut self, record: &AbuseRecord) -> Result<(), StoreError> {
        self.work.users.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.work.orders.contains_key(&order.id) {
            return Err(StoreError::Storage(format!(
                "order already exists: {}",
                order.id
            )));
        }
        self.work.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn fetch_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        match self.work.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(StoreError::Storage(format!("no such order: {id}"))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Working copy is simply dropped.
        Ok(())
    }
}
