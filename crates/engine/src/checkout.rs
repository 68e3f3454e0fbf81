//! Checkout coordinator: all-or-nothing order commits.
//!
//! Two entry points share one commit path: a multi-item cart checkout and a
//! single-item quick buy. Both run as one transaction; any failure at any
//! step rolls the whole thing back, so no stock decrement, partial order, or
//! released hold survives a failed attempt.
//!
//! Deliberately absent: a ban check. The ban throttles new holds only; a
//! banned user may still complete a purchase. This asymmetry is a product
//! decision carried over as-is.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use curio_core::{DomainError, ItemId, OrderId, UserId};
use curio_orders::{
    cart_total, normalize_lines, CartLine, CustomerDetails, Order, OrderLine, OrderStatus,
};

use crate::error::EngineError;
use crate::ledger::StockLedger;
use crate::store::{Store, StoreTx};

#[derive(Clone)]
pub struct CheckoutCoordinator {
    store: Arc<dyn Store>,
}

impl CheckoutCoordinator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Commit a cart as one order.
    ///
    /// Lines are processed in ascending item-id order to bound lock-ordering
    /// deadlocks. The total is computed from the caller-supplied unit prices
    /// (price-at-add-to-cart semantics): a price change after the item went
    /// into the cart is honored at the stale price, by design.
    pub async fn checkout(
        &self,
        user_id: Option<UserId>,
        lines: Vec<CartLine>,
        customer: CustomerDetails,
        referral_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Order, EngineError> {
        let lines = normalize_lines(lines)?;
        let mut tx = self.store.begin().await?;
        let result = async {
            for line in &lines {
                StockLedger::try_decrement(tx.as_mut(), line.item_id, line.quantity).await?;
            }
            self.persist_order(tx.as_mut(), user_id, &lines, customer, referral_code, now)
                .await
        }
        .await;
        self.finish(tx, result).await
    }

    /// Single-line checkout. The unit price is read from the live item
    /// inside the transaction — a quick buy carries no client-side price
    /// snapshot to honor.
    pub async fn quick_buy(
        &self,
        user_id: Option<UserId>,
        item_id: ItemId,
        quantity: i64,
        customer: CustomerDetails,
        referral_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Order, EngineError> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1").into());
        }
        let mut tx = self.store.begin().await?;
        let result = async {
            let item = StockLedger::try_decrement(tx.as_mut(), item_id, quantity).await?;
            let lines = [CartLine {
                item_id,
                quantity,
                unit_price: item.price,
            }];
            self.persist_order(tx.as_mut(), user_id, &lines, customer, referral_code, now)
                .await
        }
        .await;
        self.finish(tx, result).await
    }

    /// Cancel a pending/processing order and return its stock to the ledger.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let mut order = tx
                .fetch_order(order_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            if !order.status.can_transition(OrderStatus::Cancelled) {
                return Err(DomainError::validation(format!(
                    "order cannot be cancelled from {:?} state",
                    order.status
                ))
                .into());
            }
            for line in &order.lines {
                StockLedger::increment(tx.as_mut(), line.item_id, line.quantity).await?;
            }
            tx.update_order_status(order_id, OrderStatus::Cancelled).await?;
            order.status = OrderStatus::Cancelled;
            Ok(order)
        }
        .await;
        self.finish(tx, result).await
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let mut tx = self.store.begin().await?;
        let result = tx.fetch_order(order_id).await;
        match result {
            Ok(Some(order)) => {
                tx.commit().await?;
                Ok(order)
            }
            Ok(None) => {
                let _ = tx.rollback().await;
                Err(DomainError::NotFound.into())
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.into())
            }
        }
    }

    /// Shared tail of the commit path: order insert plus penalty-free
    /// release of any holds the buyer had on the purchased items.
    async fn persist_order(
        &self,
        tx: &mut dyn StoreTx,
        user_id: Option<UserId>,
        lines: &[CartLine],
        customer: CustomerDetails,
        referral_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Order, EngineError> {
        let total = cart_total(lines)?;
        let order_lines = lines
            .iter()
            .map(|l| OrderLine {
                item_id: l.item_id,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect();
        let order = Order::pending(user_id, order_lines, total, customer, referral_code, now);
        tx.insert_order(&order).await?;

        if let Some(user) = user_id {
            for line in lines {
                tx.delete_holds_for(user, line.item_id).await?;
            }
        }
        Ok(order)
    }

    async fn finish(
        &self,
        tx: Box<dyn StoreTx>,
        result: Result<Order, EngineError>,
    ) -> Result<Order, EngineError> {
        match result {
            Ok(order) => {
                tx.commit().await?;
                info!(order_id = %order.id, total = %order.total, "order committed");
                Ok(order)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}
