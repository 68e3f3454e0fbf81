//! Request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curio_core::{ItemId, UserId};
use curio_orders::{CustomerDetails, Order};
use curio_reservations::Hold;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub stock: i64,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseHoldRequest {
    pub user_id: UserId,
    pub item_id: ItemId,
}

#[derive(Debug, Serialize)]
pub struct HoldResponse {
    pub hold_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<Hold> for HoldResponse {
    fn from(hold: Hold) -> Self {
        Self {
            hold_id: hold.id.to_string(),
            item_id: hold.item_id.to_string(),
            quantity: hold.quantity,
            expires_at: hold.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutLineRequest {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Price snapshotted when the item went into the cart.
    pub unit_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub lines: Vec<CheckoutLineRequest>,
    pub customer: CustomerDetails,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuickBuyRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub item_id: ItemId,
    pub quantity: i64,
    pub customer: CustomerDetails,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub status: curio_orders::OrderStatus,
    pub total_cents: i64,
    pub total: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            status: order.status,
            total_cents: order.total.cents(),
            total: order.total.to_string(),
        }
    }
}
