//! Stock adjustment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use depot_core::adjustment::AdjustmentItemInput;
use depot_core::permission::Permission;
use depot_db::entities::stock_adjustments;
use depot_db::repositories::adjustment::db_status_to_core;
use depot_db::repositories::{AdjustmentWithItems, CreateAdjustmentInput, UpdateAdjustmentInput};
use depot_shared::types::{StockAdjustmentId, WarehouseId};

/// Creates the stock adjustment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/stock-adjustments",
            get(list_adjustments).post(create_adjustment),
        )
        .route(
            "/stock-adjustments/{id}",
            get(get_adjustment)
                .patch(update_adjustment)
                .delete(delete_adjustment),
        )
        .route("/stock-adjustments/{id}/approve", post(approve_adjustment))
}

/// Request body for creating a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct CreateAdjustmentRequest {
    /// Warehouse counted.
    pub warehouse_id: Uuid,
    /// Count date, today if omitted.
    pub adjustment_date: Option<NaiveDate>,
    /// Why stock is being corrected.
    pub reason: String,
    /// Notes.
    pub notes: Option<String>,
    /// Counted products.
    pub items: Vec<AdjustmentItemInput>,
}

/// Request body for editing a draft adjustment.
#[derive(Debug, Deserialize)]
pub struct UpdateAdjustmentRequest {
    /// Count date.
    pub adjustment_date: Option<NaiveDate>,
    /// Reason.
    pub reason: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Replacement items; system quantities are re-read.
    pub items: Option<Vec<AdjustmentItemInput>>,
}

/// Response for a stock adjustment.
#[derive(Debug, Serialize)]
pub struct AdjustmentResponse {
    /// Adjustment ID.
    pub id: Uuid,
    /// Adjustment number.
    pub adjustment_number: String,
    /// Warehouse counted.
    pub warehouse_id: Uuid,
    /// Count date.
    pub adjustment_date: String,
    /// Reason.
    pub reason: String,
    /// Notes.
    pub notes: Option<String>,
    /// Status.
    pub status: &'static str,
    /// Approver.
    pub approved_by: Option<Uuid>,
    /// Approval timestamp.
    pub approved_at: Option<String>,
    /// Created by user ID.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
    /// Counted items, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<AdjustmentItemResponse>>,
}

/// Response for an adjustment item.
#[derive(Debug, Serialize)]
pub struct AdjustmentItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Product counted.
    pub product_id: Uuid,
    /// Quantity on record.
    pub system_quantity: String,
    /// Quantity counted.
    pub actual_quantity: String,
    /// actual − system.
    pub difference: String,
    /// Note.
    pub note: Option<String>,
}

fn header_to_response(header: stock_adjustments::Model) -> AdjustmentResponse {
    AdjustmentResponse {
        id: header.id,
        adjustment_number: header.adjustment_number,
        warehouse_id: header.warehouse_id,
        adjustment_date: header.adjustment_date.to_string(),
        reason: header.reason,
        notes: header.notes,
        status: db_status_to_core(header.status).as_str(),
        approved_by: header.approved_by,
        approved_at: header.approved_at.map(|t| t.to_rfc3339()),
        created_by: header.created_by,
        created_at: header.created_at.to_rfc3339(),
        items: None,
    }
}

fn adjustment_to_response(adj: AdjustmentWithItems) -> AdjustmentResponse {
    let items = adj
        .items
        .into_iter()
        .map(|item| AdjustmentItemResponse {
            id: item.id,
            product_id: item.product_id,
            system_quantity: item.system_quantity.to_string(),
            actual_quantity: item.actual_quantity.to_string(),
            difference: item.difference.to_string(),
            note: item.note,
        })
        .collect();

    AdjustmentResponse {
        items: Some(items),
        ..header_to_response(adj.adjustment)
    }
}

/// GET `/stock-adjustments` - Adjustment headers, newest first.
async fn list_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsView)?;

    let adjustments = state.adjustments().list(ctx.organization_id).await?;

    Ok(Json(adjustments.into_iter().map(header_to_response).collect::<Vec<_>>()))
}

/// POST `/stock-adjustments` - Record a physical count as a draft.
async fn create_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsManage)?;

    let input = CreateAdjustmentInput {
        warehouse_id: WarehouseId::from_uuid(payload.warehouse_id),
        adjustment_date: payload.adjustment_date,
        reason: payload.reason,
        notes: payload.notes,
        items: payload.items,
    };

    let adj = state
        .adjustments()
        .create(ctx.organization_id, ctx.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(adjustment_to_response(adj))))
}

/// GET `/stock-adjustments/{id}` - Adjustment with items.
async fn get_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsView)?;

    let adj = state
        .adjustments()
        .get(ctx.organization_id, StockAdjustmentId::from_uuid(id))
        .await?;

    Ok(Json(adjustment_to_response(adj)))
}

/// PATCH `/stock-adjustments/{id}` - Edit a draft adjustment.
async fn update_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsManage)?;

    let input = UpdateAdjustmentInput {
        adjustment_date: payload.adjustment_date,
        reason: payload.reason,
        notes: payload.notes,
        items: payload.items,
    };

    let adj = state
        .adjustments()
        .update(
            ctx.organization_id,
            ctx.user_id,
            StockAdjustmentId::from_uuid(id),
            input,
        )
        .await?;

    Ok(Json(adjustment_to_response(adj)))
}

/// DELETE `/stock-adjustments/{id}` - Discard a draft adjustment.
async fn delete_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsManage)?;

    state
        .adjustments()
        .delete(
            ctx.organization_id,
            ctx.user_id,
            StockAdjustmentId::from_uuid(id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST `/stock-adjustments/{id}/approve` - Book the counted differences.
async fn approve_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::AdjustmentsApprove)?;

    let adj = state
        .adjustments()
        .approve(
            ctx.organization_id,
            ctx.user_id,
            StockAdjustmentId::from_uuid(id),
        )
        .await?;

    Ok(Json(adjustment_to_response(adj)))
}
