//! Reservation manager: soft holds against the stock ledger.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use curio_catalog::ItemStatus;
use curio_core::{DomainError, ItemId, UserId};
use curio_reservations::{BanPolicy, Hold, DEFAULT_HOLD_TTL};

use crate::abandonment::AbandonmentPolicy;
use crate::error::EngineError;
use crate::store::{Store, StoreTx, SweepScope};

/// Point-in-time availability snapshot for an item.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Availability {
    pub stock: i64,
    pub held: i64,
    pub available: i64,
    pub status: ItemStatus,
}

/// Creates, queries, and expires soft holds.
#[derive(Clone)]
pub struct ReservationManager {
    store: Arc<dyn Store>,
    abandonment: AbandonmentPolicy,
    ttl: Duration,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn Store>, policy: BanPolicy, ttl: Duration) -> Self {
        Self {
            store,
            abandonment: AbandonmentPolicy::new(policy),
            ttl,
        }
    }

    pub fn with_default_ttl(store: Arc<dyn Store>, policy: BanPolicy) -> Self {
        Self::new(store, policy, DEFAULT_HOLD_TTL)
    }

    /// Claim one time-limited hold on an item.
    ///
    /// Preconditions, in order: the user is not banned; after lazily
    /// sweeping this item's expired holds, `stock - Σ(active hold qty)`
    /// covers the requested quantity. The item row is locked before the
    /// availability math, so concurrent claims on the same item serialize.
    pub async fn create_hold(
        &self,
        user_id: UserId,
        item_id: ItemId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> Result<Hold, EngineError> {
        if qty < 1 {
            return Err(DomainError::validation("quantity must be at least 1").into());
        }
        let mut tx = self.store.begin().await?;
        match self
            .create_hold_in(tx.as_mut(), user_id, item_id, qty, now)
            .await
        {
            Ok(hold) => {
                tx.commit().await?;
                debug!(%user_id, %item_id, qty, expires_at = %hold.expires_at, "hold created");
                Ok(hold)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    async fn create_hold_in(
        &self,
        tx: &mut dyn StoreTx,
        user_id: UserId,
        item_id: ItemId,
        qty: i64,
        now: DateTime<Utc>,
    ) -> Result<Hold, EngineError> {
        self.abandonment.check_not_banned(tx, user_id, now).await?;

        let item = tx
            .item_for_update(item_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        // Opportunistic sweep of this item's lapsed holds before computing
        // availability; penalties ride in the same transaction.
        let expired = tx.delete_expired_holds(SweepScope::Item(item_id), now).await?;
        self.penalize(tx, &expired, now).await;

        let held: i64 = tx
            .active_holds_for_item(item_id, now)
            .await?
            .iter()
            .map(|h| h.quantity)
            .sum();
        if item.stock - held < qty {
            return Err(DomainError::insufficient_stock(item.name).into());
        }

        let hold = Hold::new(user_id, item_id, qty, self.ttl, now)?;
        tx.insert_hold(&hold).await?;
        Ok(hold)
    }

    /// Delete all expired holds and record one abandonment per hold.
    ///
    /// Idempotent by construction: the single delete-returning statement
    /// hands each expired hold to exactly one sweep. Returns the number of
    /// holds released.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let mut tx = self.store.begin().await?;
        let expired = match tx.delete_expired_holds(SweepScope::Global, now).await {
            Ok(expired) => expired,
            Err(err) => {
                let _ = tx.rollback().await;
                return Err(err.into());
            }
        };
        self.penalize(tx.as_mut(), &expired, now).await;
        tx.commit().await?;
        Ok(expired.len())
    }

    /// Remove any active hold for the pair without penalty (a hold that
    /// converted into a checkout, or a user changing their mind).
    pub async fn release(&self, user_id: UserId, item_id: ItemId) -> Result<u64, EngineError> {
        let mut tx = self.store.begin().await?;
        let released = match tx.delete_holds_for(user_id, item_id).await {
            Ok(n) => n,
            Err(err) => {
                let _ = tx.rollback().await;
                return Err(err.into());
            }
        };
        tx.commit().await?;
        Ok(released)
    }

    /// `stock - Σ(active, non-expired hold quantities)` right now.
    pub async fn availability(
        &self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Availability, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let item = tx
                .fetch_item(item_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let held: i64 = tx
                .active_holds_for_item(item_id, now)
                .await?
                .iter()
                .map(|h| h.quantity)
                .sum();
            Ok::<_, EngineError>(Availability {
                stock: item.stock,
                held,
                available: item.stock - held,
                status: item.status,
            })
        }
        .await;
        match result {
            Ok(availability) => {
                tx.commit().await?;
                Ok(availability)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Best-effort penalty recording for a batch of lapsed holds. A failed
    /// counter update is logged and swallowed; expiry cleanup must never
    /// block on it.
    async fn penalize(&self, tx: &mut dyn StoreTx, expired: &[Hold], now: DateTime<Utc>) {
        for hold in expired {
            match self.abandonment.record_failure(tx, hold.user_id, now).await {
                Ok(record) if record.is_banned(now) => {
                    warn!(user_id = %hold.user_id, until = ?record.banned_until, "user banned after repeated abandonment");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(user_id = %hold.user_id, error = %err, "failed to record abandonment; continuing sweep");
                }
            }
        }
    }
}
