//! Purchase order routes.

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
use depot_core::permission::Permission;
use depot_core::purchasing::{PurchaseOrderLineInput, PurchaseOrderStatus};
use depot_db::entities::purchase_orders;
use depot_db::repositories::purchase_order::db_status_to_core;
use depot_db::repositories::{
    CreatePurchaseOrderInput, PurchaseOrderWithItems, UpdatePurchaseOrderInput,
};
use depot_shared::types::{PurchaseOrderId, WarehouseId};

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route(
            "/purchase-orders/{id}",
            get(get_purchase_order).patch(update_purchase_order),
        )
        .route("/purchase-orders/{id}/receive", post(receive_purchase_order))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a purchase order.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderRequest {
    /// Supplier ID.
    pub supplier_id: Uuid,
    /// Order date (YYYY-MM-DD), today if omitted.
    pub order_date: Option<NaiveDate>,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Notes.
    pub notes: Option<String>,
    /// Order lines.
    pub items: Vec<PurchaseOrderLineInput>,
}

/// Request body for updating a draft purchase order.
#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    /// Supplier ID.
    pub supplier_id: Option<Uuid>,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Notes.
    pub notes: Option<String>,
    /// `ORDERED` or `CANCELLED`.
    pub status: Option<String>,
    /// Replacement lines.
    pub items: Option<Vec<PurchaseOrderLineInput>>,
}

/// Request body for receiving a purchase order.
#[derive(Debug, Deserialize)]
pub struct ReceivePurchaseOrderRequest {
    /// Warehouse the goods arrive in.
    pub warehouse_id: Uuid,
}

/// Response for a purchase order.
#[derive(Debug, Serialize)]
pub struct PurchaseOrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Order number.
    pub order_number: String,
    /// Supplier ID.
    pub supplier_id: Uuid,
    /// Status.
    pub status: &'static str,
    /// Order date.
    pub order_date: String,
    /// Expected delivery date.
    pub expected_date: Option<String>,
    /// Σ line totals.
    pub total_amount: String,
    /// Notes.
    pub notes: Option<String>,
    /// Warehouse the order was received into.
    pub received_warehouse_id: Option<Uuid>,
    /// Receipt timestamp.
    pub received_at: Option<String>,
    /// Receiving user.
    pub received_by: Option<Uuid>,
    /// Created by user ID.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
    /// Lines, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PurchaseOrderItemResponse>>,
}

/// Response for a purchase order line.
#[derive(Debug, Serialize)]
pub struct PurchaseOrderItemResponse {
    /// Line ID.
    pub id: Uuid,
    /// Line number.
    pub line_number: i32,
    /// Product ID.
    pub product_id: Uuid,
    /// Quantity ordered.
    pub quantity: String,
    /// Price per unit.
    pub unit_price: String,
    /// quantity × unit price.
    pub total: String,
}

fn header_to_response(order: purchase_orders::Model) -> PurchaseOrderResponse {
    PurchaseOrderResponse {
        id: order.id,
        order_number: order.order_number,
        supplier_id: order.supplier_id,
        status: db_status_to_core(order.status).as_str(),
        order_date: order.order_date.to_string(),
        expected_date: order.expected_date.map(|d| d.to_string()),
        total_amount: order.total_amount.to_string(),
        notes: order.notes,
        received_warehouse_id: order.received_warehouse_id,
        received_at: order.received_at.map(|t| t.to_rfc3339()),
        received_by: order.received_by,
        created_by: order.created_by,
        created_at: order.created_at.to_rfc3339(),
        items: None,
    }
}

fn order_to_response(po: PurchaseOrderWithItems) -> PurchaseOrderResponse {
    let items = po
        .items
        .into_iter()
        .map(|item| PurchaseOrderItemResponse {
            id: item.id,
            line_number: item.line_number,
            product_id: item.product_id,
            quantity: item.quantity.to_string(),
            unit_price: item.unit_price.to_string(),
            total: item.total.to_string(),
        })
        .collect();

    PurchaseOrderResponse {
        items: Some(items),
        ..header_to_response(po.order)
    }
}

fn parse_status(value: &str) -> Result<PurchaseOrderStatus, ApiError> {
    PurchaseOrderStatus::parse(value)
        .ok_or_else(|| ApiError::validation(format!("Unknown purchase order status: {value}")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/purchase-orders` - Create a draft purchase order.
async fn create_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::PurchaseOrdersManage)?;

    let input = CreatePurchaseOrderInput {
        supplier_id: payload.supplier_id,
        order_date: payload.order_date,
        expected_date: payload.expected_date,
        notes: payload.notes,
        items: payload.items,
    };

    let po = state
        .purchase_orders()
        .create(ctx.organization_id, ctx.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(order_to_response(po))))
}

/// GET `/purchase-orders` - Purchase order headers, newest first.
async fn list_purchase_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::PurchaseOrdersView)?;

    let orders = state.purchase_orders().list(ctx.organization_id).await?;

    Ok(Json(orders.into_iter().map(header_to_response).collect::<Vec<_>>()))
}

/// GET `/purchase-orders/{id}` - Purchase order with lines.
async fn get_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::PurchaseOrdersView)?;

    let po = state
        .purchase_orders()
        .get(ctx.organization_id, PurchaseOrderId::from_uuid(id))
        .await?;

    Ok(Json(order_to_response(po)))
}

/// PATCH `/purchase-orders/{id}` - Edit a draft purchase order.
async fn update_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::PurchaseOrdersManage)?;

    let input = UpdatePurchaseOrderInput {
        supplier_id: payload.supplier_id,
        expected_date: payload.expected_date,
        notes: payload.notes,
        status: payload.status.as_deref().map(parse_status).transpose()?,
        items: payload.items,
    };

    let po = state
        .purchase_orders()
        .update(
            ctx.organization_id,
            ctx.user_id,
            PurchaseOrderId::from_uuid(id),
            input,
        )
        .await?;

    Ok(Json(order_to_response(po)))
}

/// POST `/purchase-orders/{id}/receive` - Receive every line into a warehouse.
async fn receive_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::PurchaseOrdersReceive)?;

    let po = state
        .purchase_orders()
        .receive(
            ctx.organization_id,
            ctx.user_id,
            PurchaseOrderId::from_uuid(id),
            WarehouseId::from_uuid(payload.warehouse_id),
        )
        .await?;

    Ok(Json(order_to_response(po)))
}
