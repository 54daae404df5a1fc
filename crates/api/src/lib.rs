//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for stock, purchasing, adjustments and fulfillment
//! - Authentication middleware and permission checks
//! - Mapping of domain errors to HTTP responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use depot_core::audit::AuditSink;
use depot_db::{
    AdjustmentRepository, FulfillmentRepository, PurchaseOrderRepository, StockLedgerRepository,
};
use depot_shared::JwtService;
use depot_shared::config::InventoryConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Audit sink for workflow events.
    pub audit: Arc<dyn AuditSink>,
    /// Inventory defaults.
    pub inventory: InventoryConfig,
}

impl AppState {
    /// Stock ledger repository bound to this state.
    #[must_use]
    pub fn stock_ledger(&self) -> StockLedgerRepository {
        StockLedgerRepository::new((*self.db).clone(), Arc::clone(&self.audit))
    }

    /// Purchase order repository bound to this state.
    #[must_use]
    pub fn purchase_orders(&self) -> PurchaseOrderRepository {
        PurchaseOrderRepository::new((*self.db).clone(), Arc::clone(&self.audit))
    }

    /// Stock adjustment repository bound to this state.
    #[must_use]
    pub fn adjustments(&self) -> AdjustmentRepository {
        AdjustmentRepository::new((*self.db).clone(), Arc::clone(&self.audit))
    }

    /// Sales order and shipment repository bound to this state.
    #[must_use]
    pub fn fulfillment(&self) -> FulfillmentRepository {
        FulfillmentRepository::new((*self.db).clone(), Arc::clone(&self.audit))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
