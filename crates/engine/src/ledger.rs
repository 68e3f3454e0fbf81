//! Stock ledger: the sole owner of stock mutation.
//!
//! Both acquisition paths (holds and checkouts) and the cancellation
//! add-back go through these two primitives. The item row is loaded with an
//! exclusive lock inside the caller's ambient transaction, so the
//! check-then-decrement is one atomic step — never a read and a write across
//! two round trips.

use curio_catalog::Item;
use curio_core::{DomainError, ItemId};

use crate::error::EngineError;
use crate::store::StoreTx;

pub struct StockLedger;

impl StockLedger {
    /// Atomically check `stock >= qty` and decrement, returning the updated
    /// item (callers use its name for error detail and its price for
    /// live-price checkouts).
    pub async fn try_decrement(
        tx: &mut dyn StoreTx,
        item_id: ItemId,
        qty: i64,
    ) -> Result<Item, EngineError> {
        let mut item = tx
            .item_for_update(item_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        item.try_decrement(qty)?;
        tx.update_item(&item).await?;
        Ok(item)
    }

    /// Atomic add-back, used when a committed order is cancelled.
    pub async fn increment(
        tx: &mut dyn StoreTx,
        item_id: ItemId,
        qty: i64,
    ) -> Result<Item, EngineError> {
        let mut item = tx
            .item_for_update(item_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        item.increment(qty)?;
        tx.update_item(&item).await?;
        Ok(item)
    }
}
