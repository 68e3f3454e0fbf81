use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use curio_core::DomainError;
use curio_engine::{EngineError, StoreError};

/// Default engine-error → HTTP mapping. Route handlers may special-case a
/// variant first (the holds route renders `InsufficientStock` as
/// `unavailable`) and fall back to this for the rest.
pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    let retryable = err.is_retryable();
    match err {
        EngineError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation", msg)
        }
        EngineError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        EngineError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        EngineError::Domain(DomainError::InsufficientStock { item }) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock for \"{item}\""),
                "item": item,
            })),
        )
            .into_response(),
        EngineError::Domain(DomainError::Banned { until }) => {
            // Remaining hours, rounded up, for the user-facing message.
            let hours = ((until - Utc::now()).num_minutes().max(0) + 59) / 60;
            (
                StatusCode::FORBIDDEN,
                axum::Json(json!({
                    "error": "banned",
                    "message": format!("reservations suspended for another {hours}h"),
                    "banned_until": until,
                    "hours_remaining": hours,
                })),
            )
                .into_response()
        }
        EngineError::Store(StoreError::Conflict(msg)) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "conflict",
                "message": msg,
                "retryable": retryable,
            })),
        )
            .into_response(),
        EngineError::Store(StoreError::Storage(msg)) => {
            tracing::error!(error = %msg, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "temporary failure; please retry",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_conflict_maps_to_retryable_409() {
        let err = EngineError::Store(StoreError::Conflict("lock timeout".to_string()));
        assert!(err.is_retryable());

        let response = engine_error_to_response(err);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn storage_failure_is_a_non_retryable_500() {
        let err = EngineError::Store(StoreError::Storage("connection reset".to_string()));
        assert!(!err.is_retryable());

        let response = engine_error_to_response(err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "storage_error");
    }
}
