use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use curio_core::DomainError;
use curio_engine::EngineError;

use crate::app::{dto, errors};
use crate::app::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/holds", post(create_hold).delete(release_hold))
        .route("/holds/sweep", post(sweep_holds))
}

pub async fn create_hold(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateHoldRequest>,
) -> axum::response::Response {
    match services
        .reservations
        .create_hold(body.user_id, body.item_id, body.quantity, Utc::now())
        .await
    {
        Ok(hold) => (StatusCode::CREATED, Json(dto::HoldResponse::from(hold))).into_response(),
        Err(EngineError::Domain(DomainError::InsufficientStock { item })) => errors::json_error(
            StatusCode::CONFLICT,
            "unavailable",
            format!("\"{item}\" has no unit available to hold"),
        ),
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn release_hold(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReleaseHoldRequest>,
) -> axum::response::Response {
    match services.reservations.release(body.user_id, body.item_id).await {
        Ok(released) => (StatusCode::OK, Json(json!({ "released": released }))).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}

pub async fn sweep_holds(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reservations.sweep_expired(Utc::now()).await {
        Ok(released) => (StatusCode::OK, Json(json!({ "released": released }))).into_response(),
        Err(err) => errors::engine_error_to_response(err),
    }
}
