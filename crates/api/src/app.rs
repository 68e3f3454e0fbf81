use std::sync::Arc;

use axum::{extract::Extension, Router};
use chrono::Duration;
use tower::ServiceBuilder;

use curio_engine::{CatalogService, CheckoutCoordinator, ReservationManager, Store};
use curio_reservations::BanPolicy;

pub mod dto;
pub mod errors;
pub mod routes;

/// Engine services shared by every handler.
pub struct AppServices {
    pub catalog: CatalogService,
    pub reservations: ReservationManager,
    pub checkout: CheckoutCoordinator,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, policy: BanPolicy, hold_ttl: Duration) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            reservations: ReservationManager::new(store.clone(), policy, hold_ttl),
            checkout: CheckoutCoordinator::new(store),
        }
    }
}

pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .merge(routes::items::router())
        .merge(routes::holds::router())
        .merge(routes::checkout::router())
        .merge(routes::orders::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use curio_engine::InMemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let services = Arc::new(AppServices::new(
            store,
            BanPolicy::default(),
            Duration::minutes(15),
        ));
        build_app(services)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_item(app: &Router, name: &str, stock: i64, price_cents: i64) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/items",
                json!({"name": name, "stock": stock, "price_cents": price_cents}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn hold_then_conflict_then_checkout_roundtrip() {
        let app = test_app();
        let item_id = create_item(&app, "hallway clock", 1, 45000).await;
        let user = uuid::Uuid::now_v7().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/holds",
                json!({"user_id": user, "item_id": item_id, "quantity": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(json_body(response).await["expires_at"].is_string());

        // Second claimant is denied: the one unit is held.
        let rival = uuid::Uuid::now_v7().to_string();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/holds",
                json!({"user_id": rival, "item_id": item_id, "quantity": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "unavailable");

        // The holder converts the hold by checking out.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/checkout",
                json!({
                    "user_id": user,
                    "lines": [{"item_id": item_id, "quantity": 1, "unit_price_cents": 45000}],
                    "customer": {"name": "A", "email": "a@example.com", "shipping_address": "1 Road"},
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["total_cents"], 45000);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/items/{item_id}/availability"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["stock"], 0);
        assert_eq!(body["held"], 0);
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_item() {
        let app = test_app();
        let item_id = create_item(&app, "steamer trunk", 1, 120000).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/checkout",
                json!({
                    "lines": [{"item_id": item_id, "quantity": 2, "unit_price_cents": 120000}],
                    "customer": {"name": "B", "email": "b@example.com", "shipping_address": "2 Road"},
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["item"], "steamer trunk");
    }

    #[tokio::test]
    async fn empty_cart_is_a_validation_error() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/checkout",
                json!({
                    "lines": [],
                    "customer": {"name": "C", "email": "c@example.com", "shipping_address": "3 Road"},
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "validation");
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/items/{}", uuid::Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_item_id_is_rejected() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/items/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_id");
    }

    #[tokio::test]
    async fn sweep_endpoint_reports_released_count() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/holds/sweep", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["released"], 0);
    }
}
