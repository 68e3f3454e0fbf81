use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curio_core::{ItemId, Money, OrderId, UserId};

/// Order status lifecycle.
///
/// This engine only ever creates orders in `Pending`; the remaining
/// transitions are driven by external fulfillment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Pending -> {Processing -> Shipped -> Delivered} | Cancelled.
    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

/// Order line: item, quantity, unit price.
///
/// `unit_price` is snapshotted at commit time and never recomputed, so later
/// price changes on the item do not retroactively alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Free-form customer/shipping details captured at checkout.
///
/// Stored verbatim; validation is an external collaborator's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub shipping_address: String,
}

/// A committed, payment-pending purchase.
///
/// Created atomically by the checkout coordinator: either the header and all
/// lines exist, or none do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Money,
    /// `None` for guest checkouts.
    pub user_id: Option<UserId>,
    /// Opaque attribution tag; never mutated by this engine.
    pub referral_code: Option<String>,
    pub customer: CustomerDetails,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn pending(
        user_id: Option<UserId>,
        lines: Vec<OrderLine>,
        total: Money,
        customer: CustomerDetails,
        referral_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            status: OrderStatus::Pending,
            total,
            user_id,
            referral_code,
            customer,
            lines,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_allows_forward_path_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Processing));
        assert!(Processing.can_transition(Shipped));
        assert!(Shipped.can_transition(Delivered));
        assert!(Pending.can_transition(Cancelled));
        assert!(Processing.can_transition(Cancelled));

        assert!(!Shipped.can_transition(Cancelled));
        assert!(!Delivered.can_transition(Pending));
        assert!(!Cancelled.can_transition(Processing));
        assert!(!Pending.can_transition(Shipped));
    }

    #[test]
    fn new_orders_start_pending() {
        let order = Order::pending(
            None,
            vec![],
            Money::ZERO,
            CustomerDetails::default(),
            Some("FRIEND-10".to_string()),
            Utc::now(),
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.referral_code.as_deref(), Some("FRIEND-10"));
        assert!(order.user_id.is_none());
    }
}
