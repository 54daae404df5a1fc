//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod adjustments;
pub mod health;
pub mod purchase_orders;
pub mod sales_orders;
pub mod shipments;
pub mod stock;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(stock::routes())
        .merge(purchase_orders::routes())
        .merge(adjustments::routes())
        .merge(sales_orders::routes())
        .merge(shipments::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{AppState, create_router};
    use depot_core::audit::MemoryAuditSink;
    use depot_shared::config::InventoryConfig;
    use depot_shared::{JwtConfig, JwtService};

    fn test_state() -> AppState {
        AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            jwt_service: Arc::new(JwtService::new(JwtConfig {
                secret: "test-secret-key-for-testing".to_string(),
                access_token_expires_minutes: 15,
            })),
            audit: Arc::new(MemoryAuditSink::new()),
            inventory: InventoryConfig::default(),
        }
    }

    fn token(state: &AppState, role: &str, permissions: &[&str]) -> String {
        state
            .jwt_service
            .generate_access_token(
                Uuid::new_v4(),
                Uuid::new_v4(),
                role,
                permissions.iter().map(ToString::to_string).collect(),
            )
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "down");
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let request = Request::builder()
            .uri(format!("/api/v1/stock/{}/{}", Uuid::new_v4(), Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_token");
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/stock/low")
            .header(AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden() {
        let state = test_state();
        let token = token(&state, "clerk", &["inventory.adjustments.view"]);
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/stock-adjustments/{}/approve", Uuid::new_v4()))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("inventory.adjustments.approve")
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let state = test_state();
        let token = token(&state, "clerk", &["sales.shipments.manage"]);
        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/shipments/{}/status", Uuid::new_v4()))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"status":"LOST"}"#))
            .unwrap();

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_transfer_is_not_a_manual_movement() {
        let state = test_state();
        let token = token(&state, "owner", &[]);
        let payload = serde_json::json!({
            "product_id": Uuid::new_v4(),
            "warehouse_id": Uuid::new_v4(),
            "movement_type": "TRANSFER_IN",
            "quantity": "5",
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/stock/movements")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_database_failure_hides_details() {
        let state = test_state();
        let token = token(&state, "admin", &[]);
        let request = Request::builder()
            .uri(format!("/api/v1/purchase-orders/{}", Uuid::new_v4()))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_collections_require_view_permission() {
        let collections = [
            ("/api/v1/purchase-orders", "inventory.purchase_orders.view"),
            ("/api/v1/stock-adjustments", "inventory.adjustments.view"),
            ("/api/v1/sales-orders", "sales.orders.view"),
            ("/api/v1/shipments", "sales.shipments.view"),
        ];

        for (uri, permission) in collections {
            let state = test_state();
            let token = token(&state, "clerk", &["inventory.stock.view"]);
            let request = Request::builder()
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();

            let (status, body) = send(state, request).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert!(body["message"].as_str().unwrap().contains(permission), "{uri}");

            // Permission granted: the request reaches the disconnected database.
            let state = test_state();
            let token = self::token(&state, "clerk", &[permission]);
            let request = Request::builder()
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();

            let (status, body) = send(state, request).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["error"], "DATABASE_ERROR", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_sub_scale_quantity_is_validation_error() {
        let state = test_state();
        let token = token(&state, "owner", &[]);
        let payload = serde_json::json!({
            "product_id": Uuid::new_v4(),
            "warehouse_id": Uuid::new_v4(),
            "movement_type": "IN",
            "quantity": "0.00001",
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/stock/movements")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
