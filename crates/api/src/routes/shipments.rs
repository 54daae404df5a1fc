//! Shipment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use depot_core::fulfillment::ShipmentStatus;
use depot_core::permission::Permission;
use depot_db::entities::shipments;
use depot_db::repositories::fulfillment::db_shipment_status_to_core;
use depot_shared::types::ShipmentId;

/// Creates the shipment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shipments", get(list_shipments))
        .route("/shipments/{id}", get(get_shipment))
        .route("/shipments/{id}/status", patch(update_shipment_status))
}

/// Request body for a shipment status change.
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentStatusRequest {
    /// `SHIPPED`, `DELIVERED` or `CANCELLED`.
    pub status: String,
}

/// Response for a shipment.
#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    /// Shipment ID.
    pub id: Uuid,
    /// Shipment number.
    pub shipment_number: String,
    /// Order shipped.
    pub sales_order_id: Uuid,
    /// Warehouse the goods left from.
    pub warehouse_id: Uuid,
    /// Status.
    pub status: &'static str,
    /// Carrier.
    pub carrier: Option<String>,
    /// Tracking number.
    pub tracking_number: Option<String>,
    /// Delivery address.
    pub shipping_address: Option<String>,
    /// Handed to the carrier.
    pub shipped_date: Option<String>,
    /// Arrived.
    pub delivered_date: Option<String>,
    /// Created by user ID.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
}

pub(crate) fn shipment_to_response(shipment: shipments::Model) -> ShipmentResponse {
    ShipmentResponse {
        id: shipment.id,
        shipment_number: shipment.shipment_number,
        sales_order_id: shipment.sales_order_id,
        warehouse_id: shipment.warehouse_id,
        status: db_shipment_status_to_core(shipment.status).as_str(),
        carrier: shipment.carrier,
        tracking_number: shipment.tracking_number,
        shipping_address: shipment.shipping_address,
        shipped_date: shipment.shipped_date.map(|t| t.to_rfc3339()),
        delivered_date: shipment.delivered_date.map(|t| t.to_rfc3339()),
        created_by: shipment.created_by,
        created_at: shipment.created_at.to_rfc3339(),
    }
}

/// GET `/shipments` - Shipments, newest first.
async fn list_shipments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::ShipmentsView)?;

    let found = state.fulfillment().list_shipments(ctx.organization_id).await?;

    Ok(Json(found.into_iter().map(shipment_to_response).collect::<Vec<_>>()))
}

/// GET `/shipments/{id}` - Shipment details.
async fn get_shipment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::ShipmentsView)?;

    let shipment = state
        .fulfillment()
        .get_shipment(ctx.organization_id, ShipmentId::from_uuid(id))
        .await?;

    Ok(Json(shipment_to_response(shipment)))
}

/// PATCH `/shipments/{id}/status` - Advance or cancel a shipment.
async fn update_shipment_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = auth.require(Permission::ShipmentsManage)?;
    let status = ShipmentStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::validation(format!("Unknown shipment status: {}", payload.status))
    })?;

    let shipment = state
        .fulfillment()
        .update_shipment_status(
            ctx.organization_id,
            ctx.user_id,
            ShipmentId::from_uuid(id),
            status,
        )
        .await?;

    Ok(Json(shipment_to_response(shipment)))
}
