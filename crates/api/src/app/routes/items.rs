use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use curio_core::{ItemId, Money};

use crate::app::{dto, errors};
use crate::app::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/items", post(create_item))
        .route("/items/:id", get(get_item))
        .route("/items/:id/availability", get(get_availability))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let price = match Money::from_cents(body.price_cents) {
        Ok(price) => price,
        Err(err) => return errors::engine_error_to_response(err.into()),
    };
    match services.catalog.create_item(body.name, body.stock, price).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id")
        }
    };
    match services.catalog.fetch_item(item_id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn get_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id")
        }
    };
    match services.reservations.availability(item_id, Utc::now()).await {
        Ok(availability) => (StatusCode::OK, Json(availability)).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}
