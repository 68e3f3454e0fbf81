use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use chrono::Utc;

use curio_core::Money;
use curio_orders::CartLine;

use crate::app::{dto, errors};
use crate::app::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/checkout/quick", post(quick_buy))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let mut lines = Vec::with_capacity(body.lines.len());
    for line in body.lines {
        let unit_price = match Money::from_cents(line.unit_price_cents) {
            Ok(price) => price,
            Err(err) => return errors::engine_error_to_response(err.into()),
        };
        lines.push(CartLine {
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price,
        });
    }

    match services
        .checkout
        .checkout(body.user_id, lines, body.customer, body.referral_code, Utc::now())
        .await
    {
        Ok(order) => {
            (StatusCode::CREATED, Json(dto::OrderResponse::from(&order))).into_response()
        }
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn quick_buy(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::QuickBuyRequest>,
) -> axum::response::Response {
    match services
        .checkout
        .quick_buy(
            body.user_id,
            body.item_id,
            body.quantity,
            body.customer,
            body.referral_code,
            Utc::now(),
        )
        .await
    {
        Ok(order) => {
            (StatusCode::CREATED, Json(dto::OrderResponse::from(&order))).into_response()
        }
        Err(err) => errors::engine_error_to_response(err),
    }
}
