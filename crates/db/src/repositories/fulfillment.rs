//! Sales order and shipment repository.
//!
//! Creating a shipment issues the order's lines from a warehouse; cancelling
//! it puts them back. Delivery cascades to the order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use serde_json::json;
use uuid::Uuid;

use depot_core::audit::{self, AuditAction, AuditEvent, AuditSink};
use depot_core::fulfillment::{
    CreateSalesOrderCommand, FulfillmentError, FulfillmentService, InvoicePaid, SalesOrderStatus,
    ShipmentStatus,
};
use depot_core::numbering::DocumentType;
use depot_shared::types::{OrganizationId, ProductId, SalesOrderId, ShipmentId, UserId, WarehouseId};

use crate::entities::{
    sales_order_items, sales_orders,
    sea_orm_active_enums::{SalesOrderStatus as DbSalesOrderStatus, ShipmentStatus as DbShipmentStatus},
    shipments,
};
use crate::rls::begin_scoped;

use super::sequence::next_document_number;
use super::stock::{apply_movement, ensure_product, ensure_warehouse};

/// Sales order with its lines.
#[derive(Debug, Clone)]
pub struct SalesOrderWithItems {
    /// Order header.
    pub order: sales_orders::Model,
    /// Lines ordered by line number.
    pub items: Vec<sales_order_items::Model>,
}

/// Input for creating a shipment.
#[derive(Debug, Clone)]
pub struct CreateShipmentInput {
    /// Warehouse the goods leave from.
    pub warehouse_id: WarehouseId,
    /// Carrier name.
    pub carrier: Option<String>,
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
    /// Delivery address, defaults to the order's.
    pub shipping_address: Option<String>,
}

/// Converts a database sales order status to the core status.
#[must_use]
pub const fn db_order_status_to_core(status: DbSalesOrderStatus) -> SalesOrderStatus {
    match status {
        DbSalesOrderStatus::Draft => SalesOrderStatus::Draft,
        DbSalesOrderStatus::Confirmed => SalesOrderStatus::Confirmed,
        DbSalesOrderStatus::Shipped => SalesOrderStatus::Shipped,
        DbSalesOrderStatus::Delivered => SalesOrderStatus::Delivered,
        DbSalesOrderStatus::Cancelled => SalesOrderStatus::Cancelled,
        DbSalesOrderStatus::Returned => SalesOrderStatus::Returned,
    }
}

/// Converts a core sales order status to the database status.
#[must_use]
pub const fn core_order_status_to_db(status: SalesOrderStatus) -> DbSalesOrderStatus {
    match status {
        SalesOrderStatus::Draft => DbSalesOrderStatus::Draft,
        SalesOrderStatus::Confirmed => DbSalesOrderStatus::Confirmed,
        SalesOrderStatus::Shipped => DbSalesOrderStatus::Shipped,
        SalesOrderStatus::Delivered => DbSalesOrderStatus::Delivered,
        SalesOrderStatus::Cancelled => DbSalesOrderStatus::Cancelled,
        SalesOrderStatus::Returned => DbSalesOrderStatus::Returned,
    }
}

/// Converts a database shipment status to the core status.
#[must_use]
pub const fn db_shipment_status_to_core(status: DbShipmentStatus) -> ShipmentStatus {
    match status {
        DbShipmentStatus::Pending => ShipmentStatus::Pending,
        DbShipmentStatus::Shipped => ShipmentStatus::Shipped,
        DbShipmentStatus::Delivered => ShipmentStatus::Delivered,
        DbShipmentStatus::Cancelled => ShipmentStatus::Cancelled,
    }
}

/// Converts a core shipment status to the database status.
#[must_use]
pub const fn core_shipment_status_to_db(status: ShipmentStatus) -> DbShipmentStatus {
    match status {
        ShipmentStatus::Pending => DbShipmentStatus::Pending,
        ShipmentStatus::Shipped => DbShipmentStatus::Shipped,
        ShipmentStatus::Delivered => DbShipmentStatus::Delivered,
        ShipmentStatus::Cancelled => DbShipmentStatus::Cancelled,
    }
}

/// Sales order and shipment repository.
#[derive(Clone)]
pub struct FulfillmentRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for FulfillmentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FulfillmentRepository").finish_non_exhaustive()
    }
}

impl FulfillmentRepository {
    /// Creates a new fulfillment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Creates a DRAFT sales order with computed totals.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are no lines or a line is invalid
    /// - A product is not in the organization
    /// - Database operation fails
    pub async fn create_sales_order(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        command: CreateSalesOrderCommand,
    ) -> Result<SalesOrderWithItems, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let created = insert_order(&txn, organization_id, actor_id, command, None).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        self.record_created(organization_id, actor_id, &created, None);
        Ok(created)
    }

    /// Creates a sales order from a paid invoice.
    ///
    /// Returns `None` when the invoice has no product lines. Replaying the
    /// same event returns the order created the first time, including when
    /// replays run concurrently: the lookup and the insert share one
    /// transaction holding an advisory lock on the invoice.
    ///
    /// # Errors
    ///
    /// See [`Self::create_sales_order`].
    pub async fn create_from_invoice_paid(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        event: &InvoicePaid,
    ) -> Result<Option<SalesOrderWithItems>, FulfillmentError> {
        let Some(command) = CreateSalesOrderCommand::from_invoice_paid(event) else {
            tracing::debug!(
                organization_id = %organization_id,
                invoice_id = %event.invoice_id,
                "Paid invoice has no product lines, no sales order created"
            );
            return Ok(None);
        };

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        lock_source_invoice(&txn, organization_id, event.invoice_id).await?;

        let existing = sales_orders::Entity::find()
            .filter(sales_orders::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(sales_orders::Column::SourceInvoiceId.eq(event.invoice_id))
            .one(&txn)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;
        if let Some(order) = existing {
            let items = find_items(&txn, order.id).await?;
            txn.commit()
                .await
                .map_err(|e| FulfillmentError::Database(e.to_string()))?;
            tracing::debug!(
                organization_id = %organization_id,
                invoice_id = %event.invoice_id,
                sales_order_id = %order.id,
                "Paid invoice already has a sales order"
            );
            return Ok(Some(SalesOrderWithItems { order, items }));
        }

        let created =
            insert_order(&txn, organization_id, actor_id, command, Some(event.invoice_id)).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        self.record_created(organization_id, actor_id, &created, Some(event.invoice_id));
        Ok(Some(created))
    }

    fn record_created(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        created: &SalesOrderWithItems,
        source_invoice_id: Option<Uuid>,
    ) {
        let order = &created.order;
        tracing::info!(
            organization_id = %organization_id,
            sales_order_id = %order.id,
            order_number = %order.order_number,
            total_amount = %order.total_amount,
            "Sales order created"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::CreateSalesOrder,
                "SalesOrder",
                order.id,
            )
            .with_after(json!({
                "order_number": order.order_number,
                "total_amount": order.total_amount,
                "items": created.items.len(),
            }))
            .with_metadata(json!({ "source_invoice_id": source_invoice_id })),
        );
    }

    /// Gets a sales order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `SalesOrderNotFound` if the order is not in the organization.
    pub async fn get_sales_order(
        &self,
        organization_id: OrganizationId,
        sales_order_id: SalesOrderId,
    ) -> Result<SalesOrderWithItems, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let order = find_order(&txn, organization_id, sales_order_id, false).await?;
        let items = find_items(&txn, order.id).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        Ok(SalesOrderWithItems { order, items })
    }

    /// Lists the organization's sales orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_sales_orders(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<SalesOrderWithItems>, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let orders = sales_orders::Entity::find()
            .filter(sales_orders::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(sales_orders::Column::CreatedAt)
            .order_by_desc(sales_orders::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let mut items: HashMap<Uuid, Vec<sales_order_items::Model>> = HashMap::new();
        if !orders.is_empty() {
            let rows = sales_order_items::Entity::find()
                .filter(sales_order_items::Column::SalesOrderId.is_in(orders.iter().map(|o| o.id)))
                .order_by_asc(sales_order_items::Column::LineNumber)
                .all(&txn)
                .await
                .map_err(|e| FulfillmentError::Database(e.to_string()))?;
            for item in rows {
                items.entry(item.sales_order_id).or_default().push(item);
            }
        }

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items.remove(&order.id).unwrap_or_default();
                SalesOrderWithItems { order, items }
            })
            .collect())
    }

    /// Changes a sales order's status by hand.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the transition is not
    /// allowed.
    pub async fn update_sales_order_status(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        sales_order_id: SalesOrderId,
        new_status: SalesOrderStatus,
    ) -> Result<sales_orders::Model, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let order = find_order(&txn, organization_id, sales_order_id, true).await?;
        let current = db_order_status_to_core(order.status);
        let next = FulfillmentService::transition_order(current, new_status)?;

        let updated = set_order_status(&txn, order, next).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            sales_order_id = %updated.id,
            from = %current,
            to = %next,
            "Sales order status updated"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::UpdateSalesOrderStatus,
                "SalesOrder",
                updated.id,
            )
            .with_before(json!({ "status": current.as_str() }))
            .with_after(json!({ "status": next.as_str() })),
        );

        Ok(updated)
    }

    /// Ships a CONFIRMED sales order from a warehouse.
    ///
    /// Creates a PENDING shipment, issues every line with an OUT movement and
    /// moves the order to SHIPPED. Rolls back entirely if any line lacks stock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The order is not found or is not CONFIRMED
    /// - The warehouse is missing or inactive
    /// - Stock is insufficient for a line
    /// - Database operation fails
    pub async fn create_shipment(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        sales_order_id: SalesOrderId,
        input: CreateShipmentInput,
    ) -> Result<shipments::Model, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let order = find_order(&txn, organization_id, sales_order_id, true).await?;
        FulfillmentService::ensure_shippable(db_order_status_to_core(order.status))?;
        ensure_warehouse(&txn, organization_id, input.warehouse_id).await?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let shipment_number = next_document_number(
            &txn,
            organization_id,
            DocumentType::Shipment,
            now.year(),
        )
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let shipment_id = ShipmentId::new();
        let shipment = shipments::ActiveModel {
            id: Set(shipment_id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            sales_order_id: Set(order.id),
            warehouse_id: Set(input.warehouse_id.into_inner()),
            shipment_number: Set(shipment_number),
            status: Set(DbShipmentStatus::Pending),
            carrier: Set(input.carrier),
            tracking_number: Set(input.tracking_number),
            shipping_address: Set(input.shipping_address.or_else(|| order.shipping_address.clone())),
            shipped_date: Set(None),
            delivered_date: Set(None),
            created_by: Set(actor_id.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let lines = order_lines(&txn, order.id).await?;
        let movements = FulfillmentService::shipment_movements(
            shipment_id,
            &shipment.shipment_number,
            input.warehouse_id,
            &lines,
        );
        for movement in &movements {
            apply_movement(&txn, organization_id, actor_id, movement).await?;
        }

        let order = set_order_status(&txn, order, SalesOrderStatus::Shipped).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            sales_order_id = %order.id,
            shipment_id = %shipment.id,
            warehouse_id = %input.warehouse_id,
            lines = movements.len(),
            "Shipment created"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::CreateShipment,
                "Shipment",
                shipment.id,
            )
            .with_after(json!({
                "shipment_number": shipment.shipment_number,
                "status": ShipmentStatus::Pending.as_str(),
            }))
            .with_metadata(json!({
                "sales_order_id": order.id,
                "order_status": SalesOrderStatus::Shipped.as_str(),
            })),
        );

        Ok(shipment)
    }

    /// Lists the organization's shipments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_shipments(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<shipments::Model>, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let found = shipments::Entity::find()
            .filter(shipments::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(shipments::Column::CreatedAt)
            .order_by_desc(shipments::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        Ok(found)
    }

    /// Gets a shipment.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentNotFound` if the shipment is not in the organization.
    pub async fn get_shipment(
        &self,
        organization_id: OrganizationId,
        shipment_id: ShipmentId,
    ) -> Result<shipments::Model, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let shipment = find_shipment(&txn, organization_id, shipment_id, false).await?;

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        Ok(shipment)
    }

    /// Moves a shipment along its lifecycle.
    ///
    /// SHIPPED stamps the shipped date. DELIVERED stamps the delivered date
    /// and delivers the order. CANCELLED returns every line to stock and
    /// puts a SHIPPED order back to CONFIRMED.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The shipment or its order is not found
    /// - The transition is not allowed
    /// - Database operation fails
    pub async fn update_shipment_status(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        shipment_id: ShipmentId,
        new_status: ShipmentStatus,
    ) -> Result<shipments::Model, FulfillmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let shipment = find_shipment(&txn, organization_id, shipment_id, true).await?;
        let order = find_order(
            &txn,
            organization_id,
            SalesOrderId::from_uuid(shipment.sales_order_id),
            true,
        )
        .await?;

        let current = db_shipment_status_to_core(shipment.status);
        let order_status = db_order_status_to_core(order.status);
        let transition = FulfillmentService::transition_shipment(current, new_status, order_status)?;

        if transition.restocks {
            let lines = order_lines(&txn, order.id).await?;
            let movements = FulfillmentService::restock_movements(
                shipment_id,
                &shipment.shipment_number,
                WarehouseId::from_uuid(shipment.warehouse_id),
                &lines,
            );
            for movement in &movements {
                apply_movement(&txn, organization_id, actor_id, movement).await?;
            }
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut active: shipments::ActiveModel = shipment.into();
        active.status = Set(core_shipment_status_to_db(transition.new_status));
        if transition.sets_shipped_date {
            active.shipped_date = Set(Some(now));
        }
        if transition.sets_delivered_date {
            active.delivered_date = Set(Some(now));
        }
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        let order_id = order.id;
        if let Some(next) = transition.order_status {
            set_order_status(&txn, order, next).await?;
        }

        txn.commit()
            .await
            .map_err(|e| FulfillmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            shipment_id = %updated.id,
            from = %current,
            to = %transition.new_status,
            "Shipment status updated"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::UpdateShipmentStatus,
                "Shipment",
                updated.id,
            )
            .with_before(json!({ "status": current.as_str() }))
            .with_after(json!({ "status": transition.new_status.as_str() }))
            .with_metadata(json!({
                "sales_order_id": order_id,
                "order_status": transition.order_status.map(|s| s.as_str()),
                "restocked": transition.restocks,
            })),
        );

        Ok(updated)
    }
}

async fn insert_order(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor_id: UserId,
    command: CreateSalesOrderCommand,
    source_invoice_id: Option<Uuid>,
) -> Result<SalesOrderWithItems, FulfillmentError> {
    let (lines, totals) = FulfillmentService::price_order(&command.lines)?;

    for line in &lines {
        ensure_product(txn, organization_id, line.product_id).await?;
    }

    let order_number = next_document_number(
        txn,
        organization_id,
        DocumentType::SalesOrder,
        command.order_date.year(),
    )
    .await
    .map_err(|e| FulfillmentError::Database(e.to_string()))?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let order = sales_orders::ActiveModel {
        id: Set(SalesOrderId::new().into_inner()),
        organization_id: Set(organization_id.into_inner()),
        order_number: Set(order_number),
        customer_id: Set(command.customer_id),
        status: Set(DbSalesOrderStatus::Draft),
        order_date: Set(command.order_date),
        expected_shipment_date: Set(command.expected_shipment_date),
        shipping_address: Set(command.shipping_address),
        notes: Set(command.notes),
        subtotal: Set(totals.subtotal),
        tax_amount: Set(totals.tax_amount),
        discount_amount: Set(totals.discount_amount),
        total_amount: Set(totals.total_amount),
        source_invoice_id: Set(source_invoice_id),
        created_by: Set(actor_id.into_inner()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(|e| FulfillmentError::Database(e.to_string()))?;

    let mut items = Vec::with_capacity(lines.len());
    for (line_number, line) in (1..).zip(&lines) {
        let item = sales_order_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            sales_order_id: Set(order.id),
            product_id: Set(line.product_id.into_inner()),
            line_number: Set(line_number),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_amount: Set(line.tax_amount),
            discount_amount: Set(line.discount_amount),
            total: Set(line.total),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))?;
        items.push(item);
    }

    Ok(SalesOrderWithItems { order, items })
}

/// Serializes order creation per paid invoice until the transaction ends.
async fn lock_source_invoice(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    invoice_id: Uuid,
) -> Result<(), FulfillmentError> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
        [invoice_lock_key(organization_id, invoice_id).into()],
    ))
    .await
    .map_err(|e| FulfillmentError::Database(e.to_string()))?;
    Ok(())
}

fn invoice_lock_key(organization_id: OrganizationId, invoice_id: Uuid) -> String {
    format!("sales_order:invoice:{organization_id}:{invoice_id}")
}

async fn find_order(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    sales_order_id: SalesOrderId,
    lock: bool,
) -> Result<sales_orders::Model, FulfillmentError> {
    let mut query = sales_orders::Entity::find_by_id(sales_order_id.into_inner())
        .filter(sales_orders::Column::OrganizationId.eq(organization_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))?
        .ok_or(FulfillmentError::SalesOrderNotFound(sales_order_id))
}

async fn find_shipment(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    shipment_id: ShipmentId,
    lock: bool,
) -> Result<shipments::Model, FulfillmentError> {
    let mut query = shipments::Entity::find_by_id(shipment_id.into_inner())
        .filter(shipments::Column::OrganizationId.eq(organization_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))?
        .ok_or(FulfillmentError::ShipmentNotFound(shipment_id))
}

async fn find_items(
    txn: &DatabaseTransaction,
    sales_order_id: Uuid,
) -> Result<Vec<sales_order_items::Model>, FulfillmentError> {
    sales_order_items::Entity::find()
        .filter(sales_order_items::Column::SalesOrderId.eq(sales_order_id))
        .order_by_asc(sales_order_items::Column::LineNumber)
        .all(txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))
}

async fn order_lines(
    txn: &DatabaseTransaction,
    sales_order_id: Uuid,
) -> Result<Vec<(ProductId, Decimal)>, FulfillmentError> {
    Ok(find_items(txn, sales_order_id)
        .await?
        .into_iter()
        .map(|item| (ProductId::from_uuid(item.product_id), item.quantity))
        .collect())
}

async fn set_order_status(
    txn: &DatabaseTransaction,
    order: sales_orders::Model,
    status: SalesOrderStatus,
) -> Result<sales_orders::Model, FulfillmentError> {
    let mut active: sales_orders::ActiveModel = order.into();
    active.status = Set(core_order_status_to_db(status));
    active.updated_at = Set(Utc::now().into());
    active
        .update(txn)
        .await
        .map_err(|e| FulfillmentError::Database(e.to_string()))
}
