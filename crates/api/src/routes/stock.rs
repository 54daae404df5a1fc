//! Stock level and movement routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use depot_core::ledger::{MovementReference, MovementRequest, MovementType, StockKey};
use depot_core::permission::Permission;
use depot_db::entities::{stock_movements, stocks};
use depot_db::repositories::MovementFilter;
use depot_db::repositories::stock::db_movement_type_to_core;
use depot_shared::types::{ProductId, WarehouseId};

/// Creates the stock routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/low", get(low_stock))
        .route("/stock/movements", get(list_movements).post(create_movement))
        .route("/stock/{product_id}/{warehouse_id}", get(get_stock))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for movement history.
#[derive(Debug, Deserialize)]
pub struct ListMovementsQuery {
    /// Filter by product.
    pub product_id: Option<Uuid>,
    /// Filter by warehouse.
    pub warehouse_id: Option<Uuid>,
    /// Filter by causing document.
    pub reference_id: Option<Uuid>,
    /// Maximum rows returned, at most 500.
    pub limit: Option<u64>,
}

/// Query parameters for the low-stock report.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Rows strictly below this quantity are returned.
    pub threshold: Option<Decimal>,
}

/// Request body for a manual movement.
#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    /// Product moved.
    pub product_id: Uuid,
    /// Warehouse holding the product.
    pub warehouse_id: Uuid,
    /// `IN`, `OUT` or `ADJUSTMENT`.
    pub movement_type: String,
    /// Magnitude for IN/OUT, signed delta for ADJUSTMENT.
    pub quantity: Decimal,
    /// Unit cost.
    pub unit_cost: Option<Decimal>,
    /// Note.
    pub note: Option<String>,
}

/// Stock level response.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    /// Product held.
    pub product_id: Uuid,
    /// Warehouse holding it.
    pub warehouse_id: Uuid,
    /// On-hand quantity.
    pub quantity: String,
    /// Row version; zero when no stock has been recorded.
    pub version: i64,
    /// Last change.
    pub updated_at: Option<String>,
}

/// Stock movement response.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    /// Movement ID.
    pub id: Uuid,
    /// Product moved.
    pub product_id: Uuid,
    /// Warehouse.
    pub warehouse_id: Uuid,
    /// Movement type.
    pub movement_type: &'static str,
    /// Stored quantity.
    pub quantity: String,
    /// On-hand before.
    pub previous_quantity: String,
    /// On-hand after.
    pub new_quantity: String,
    /// Causing document type.
    pub reference_type: String,
    /// Causing document ID.
    pub reference_id: Option<Uuid>,
    /// Unit cost.
    pub unit_cost: Option<String>,
    /// Note.
    pub note: Option<String>,
    /// Author.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
}

fn stock_to_response(stock: stocks::Model) -> StockResponse {
    StockResponse {
        product_id: stock.product_id,
        warehouse_id: stock.warehouse_id,
        quantity: stock.quantity.to_string(),
        version: stock.version,
        updated_at: Some(stock.updated_at.to_rfc3339()),
    }
}

pub(crate) fn movement_to_response(movement: stock_movements::Model) -> MovementResponse {
    MovementResponse {
        id: movement.id,
        product_id: movement.product_id,
        warehouse_id: movement.warehouse_id,
        movement_type: db_movement_type_to_core(movement.movement_type).as_str(),
        quantity: movement.quantity.to_string(),
        previous_quantity: movement.previous_quantity.to_string(),
        new_quantity: movement.new_quantity.to_string(),
        reference_type: movement.reference_type,
        reference_id: movement.reference_id,
        unit_cost: movement.unit_cost.map(|c| c.to_string()),
        note: movement.note,
        created_by: movement.created_by,
        created_at: movement.created_at.to_rfc3339(),
    }
}

fn parse_manual_type(value: &str) -> Result<MovementType, ApiError> {
    match MovementType::parse(value) {
        Some(t @ (MovementType::In | MovementType::Out | MovementType::Adjustment)) => Ok(t),
        Some(_) => Err(ApiError::validation(
            "Manual movements must be IN, OUT or ADJUSTMENT",
        )),
        None => Err(ApiError::validation(format!(
            "Unknown movement type: {value}"
        ))),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/stock/{product_id}/{warehouse_id}` - Current on-hand quantity.
async fn get_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((product_id, warehouse_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::StockView)?;

    let stock = state
        .stock_ledger()
        .get_stock(
            ctx.organization_id,
            ProductId::from_uuid(product_id),
            WarehouseId::from_uuid(warehouse_id),
        )
        .await?;

    let response = stock.map_or_else(
        || StockResponse {
            product_id,
            warehouse_id,
            quantity: Decimal::ZERO.to_string(),
            version: 0,
            updated_at: None,
        },
        stock_to_response,
    );

    Ok(Json(response))
}

/// POST `/stock/movements` - Apply a manual movement.
async fn create_movement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::StockAdjust)?;
    let movement_type = parse_manual_type(&payload.movement_type)?;

    let mut request = MovementRequest::new(
        StockKey::new(
            ProductId::from_uuid(payload.product_id),
            WarehouseId::from_uuid(payload.warehouse_id),
        ),
        movement_type,
        payload.quantity,
        MovementReference::Manual,
    );
    if let Some(unit_cost) = payload.unit_cost {
        request = request.with_unit_cost(unit_cost);
    }
    if let Some(note) = payload.note {
        request = request.with_note(note);
    }

    let result = state
        .stock_ledger()
        .adjust_stock(ctx.organization_id, ctx.user_id, &request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "stock": stock_to_response(result.stock),
            "movement": movement_to_response(result.movement),
        })),
    ))
}

/// GET `/stock/movements` - Movement history, newest first.
async fn list_movements(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListMovementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::StockView)?;

    let filter = MovementFilter {
        product_id: query.product_id.map(ProductId::from_uuid),
        warehouse_id: query.warehouse_id.map(WarehouseId::from_uuid),
        reference_id: query.reference_id,
        limit: Some(
            query
                .limit
                .unwrap_or_else(|| u64::from(state.inventory.movement_history_limit)),
        ),
    };

    let movements: Vec<MovementResponse> = state
        .stock_ledger()
        .list_movements(ctx.organization_id, &filter)
        .await?
        .into_iter()
        .map(movement_to_response)
        .collect();

    Ok(Json(json!({ "movements": movements })))
}

/// GET `/stock/low` - Stock rows below the threshold.
async fn low_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::StockView)?;
    let threshold = query
        .threshold
        .unwrap_or_else(|| Decimal::from(state.inventory.low_stock_threshold));

    let rows: Vec<StockResponse> = state
        .stock_ledger()
        .low_stock(ctx.organization_id, threshold)
        .await?
        .into_iter()
        .map(stock_to_response)
        .collect();

    Ok(Json(json!({
        "threshold": threshold.to_string(),
        "stock": rows,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IN", MovementType::In)]
    #[case("out", MovementType::Out)]
    #[case("ADJUSTMENT", MovementType::Adjustment)]
    fn test_parse_manual_type_accepts(#[case] input: &str, #[case] expected: MovementType) {
        assert_eq!(parse_manual_type(input).unwrap(), expected);
    }

    #[rstest]
    #[case("TRANSFER_IN")]
    #[case("TRANSFER_OUT")]
    #[case("SIDEWAYS")]
    fn test_parse_manual_type_rejects(#[case] input: &str) {
        let err = parse_manual_type(input).unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }
}
