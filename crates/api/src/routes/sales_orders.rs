//! Sales order routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shipments::shipment_to_response;
use crate::{AppState, error::ApiError, middleware::AuthUser};
use depot_core::fulfillment::{
    CreateSalesOrderCommand, InvoicePaid, SalesOrderLineInput, SalesOrderStatus,
};
use depot_core::permission::Permission;
use depot_db::entities::sales_orders;
use depot_db::repositories::fulfillment::db_order_status_to_core;
use depot_db::repositories::{CreateShipmentInput, SalesOrderWithItems};
use depot_shared::types::{SalesOrderId, WarehouseId};

/// Creates the sales order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales-orders", get(list_sales_orders).post(create_sales_order))
        .route("/sales-orders/from-invoice", post(create_from_invoice))
        .route("/sales-orders/{id}", get(get_sales_order))
        .route("/sales-orders/{id}/status", patch(update_sales_order_status))
        .route("/sales-orders/{id}/shipments", post(create_shipment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a sales order.
#[derive(Debug, Deserialize)]
pub struct CreateSalesOrderRequest {
    /// Customer ID.
    pub customer_id: Uuid,
    /// Order date, today if omitted.
    pub order_date: Option<NaiveDate>,
    /// Promised ship date.
    pub expected_shipment_date: Option<NaiveDate>,
    /// Delivery address.
    pub shipping_address: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Order lines.
    pub items: Vec<SalesOrderLineInput>,
}

/// Request body for a sales order status change.
#[derive(Debug, Deserialize)]
pub struct UpdateSalesOrderStatusRequest {
    /// Target status.
    pub status: String,
}

/// Request body for shipping an order.
#[derive(Debug, Deserialize)]
pub struct CreateShipmentRequest {
    /// Warehouse the goods leave from.
    pub warehouse_id: Uuid,
    /// Carrier.
    pub carrier: Option<String>,
    /// Tracking number.
    pub tracking_number: Option<String>,
    /// Delivery address; the order's address if omitted.
    pub shipping_address: Option<String>,
}

/// Response for a sales order.
#[derive(Debug, Serialize)]
pub struct SalesOrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Order number.
    pub order_number: String,
    /// Customer ID.
    pub customer_id: Uuid,
    /// Status.
    pub status: &'static str,
    /// Order date.
    pub order_date: String,
    /// Promised ship date.
    pub expected_shipment_date: Option<String>,
    /// Delivery address.
    pub shipping_address: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Σ quantity × unit price.
    pub subtotal: String,
    /// Σ tax.
    pub tax_amount: String,
    /// Σ discount.
    pub discount_amount: String,
    /// subtotal + tax − discount.
    pub total_amount: String,
    /// Invoice the order was created from.
    pub source_invoice_id: Option<Uuid>,
    /// Created by user ID.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
    /// Lines, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SalesOrderItemResponse>>,
}

/// Response for a sales order line.
#[derive(Debug, Serialize)]
pub struct SalesOrderItemResponse {
    /// Line ID.
    pub id: Uuid,
    /// Line number.
    pub line_number: i32,
    /// Product ID.
    pub product_id: Uuid,
    /// Quantity.
    pub quantity: String,
    /// Price per unit.
    pub unit_price: String,
    /// Tax.
    pub tax_amount: String,
    /// Discount.
    pub discount_amount: String,
    /// Line total.
    pub total: String,
}

fn header_to_response(order: sales_orders::Model) -> SalesOrderResponse {
    SalesOrderResponse {
        id: order.id,
        order_number: order.order_number,
        customer_id: order.customer_id,
        status: db_order_status_to_core(order.status).as_str(),
        order_date: order.order_date.to_string(),
        expected_shipment_date: order.expected_shipment_date.map(|d| d.to_string()),
        shipping_address: order.shipping_address,
        notes: order.notes,
        subtotal: order.subtotal.to_string(),
        tax_amount: order.tax_amount.to_string(),
        discount_amount: order.discount_amount.to_string(),
        total_amount: order.total_amount.to_string(),
        source_invoice_id: order.source_invoice_id,
        created_by: order.created_by,
        created_at: order.created_at.to_rfc3339(),
        items: None,
    }
}

fn order_to_response(so: SalesOrderWithItems) -> SalesOrderResponse {
    let items = so
        .items
        .into_iter()
        .map(|item| SalesOrderItemResponse {
            id: item.id,
            line_number: item.line_number,
            product_id: item.product_id,
            quantity: item.quantity.to_string(),
            unit_price: item.unit_price.to_string(),
            tax_amount: item.tax_amount.to_string(),
            discount_amount: item.discount_amount.to_string(),
            total: item.total.to_string(),
        })
        .collect();

    SalesOrderResponse {
        items: Some(items),
        ..header_to_response(so.order)
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/sales-orders` - Create a draft sales order.
async fn create_sales_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSalesOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::SalesOrdersManage)?;

    let command = CreateSalesOrderCommand {
        customer_id: payload.customer_id,
        order_date: payload
            .order_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        expected_shipment_date: payload.expected_shipment_date,
        shipping_address: payload.shipping_address,
        notes: payload.notes,
        lines: payload.items,
    };

    let so = state
        .fulfillment()
        .create_sales_order(ctx.organization_id, ctx.user_id, command)
        .await?;

    Ok((StatusCode::CREATED, Json(order_to_response(so))))
}

/// POST `/sales-orders/from-invoice` - Turn a paid invoice into a sales order.
///
/// Replays return the existing order. Invoices without product lines
/// produce no order.
async fn create_from_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(event): Json<InvoicePaid>,
) -> Result<Response, ApiError> {
    let ctx = auth.require(Permission::SalesOrdersManage)?;

    let created = state
        .fulfillment()
        .create_from_invoice_paid(ctx.organization_id, ctx.user_id, &event)
        .await?;

    Ok(match created {
        Some(so) => Json(order_to_response(so)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// GET `/sales-orders` - Sales orders with lines, newest first.
async fn list_sales_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::SalesOrdersView)?;

    let orders = state
        .fulfillment()
        .list_sales_orders(ctx.organization_id)
        .await?;

    Ok(Json(orders.into_iter().map(order_to_response).collect::<Vec<_>>()))
}

/// GET `/sales-orders/{id}` - Sales order with lines.
async fn get_sales_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::SalesOrdersView)?;

    let so = state
        .fulfillment()
        .get_sales_order(ctx.organization_id, SalesOrderId::from_uuid(id))
        .await?;

    Ok(Json(order_to_response(so)))
}

/// PATCH `/sales-orders/{id}/status` - Change order status.
async fn update_sales_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSalesOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::SalesOrdersManage)?;
    let status = SalesOrderStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::validation(format!("Unknown sales order status: {}", payload.status))
    })?;

    let order = state
        .fulfillment()
        .update_sales_order_status(
            ctx.organization_id,
            ctx.user_id,
            SalesOrderId::from_uuid(id),
            status,
        )
        .await?;

    Ok(Json(header_to_response(order)))
}

/// POST `/sales-orders/{id}/shipments` - Ship a confirmed order.
async fn create_shipment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::ShipmentsManage)?;

    let input = CreateShipmentInput {
        warehouse_id: WarehouseId::from_uuid(payload.warehouse_id),
        carrier: payload.carrier,
        tracking_number: payload.tracking_number,
        shipping_address: payload.shipping_address,
    };

    let shipment = state
        .fulfillment()
        .create_shipment(
            ctx.organization_id,
            ctx.user_id,
            SalesOrderId::from_uuid(id),
            input,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(shipment_to_response(shipment))))
}
