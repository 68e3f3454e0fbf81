use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use curio_core::OrderId;

use crate::app::{dto, errors};
use crate::app::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", post(cancel_order))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };
    match services.checkout.fetch_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };
    match services.checkout.cancel_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(dto::OrderResponse::from(&order))).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}
