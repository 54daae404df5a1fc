//! Purchase order repository.
//!
//! Create, edit and receive purchase orders. Receiving runs the order status
//! change and every IN movement in one transaction.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use depot_core::audit::{self, AuditAction, AuditEvent, AuditSink};
use depot_core::numbering::DocumentType;
use depot_core::purchasing::{
    PricedPurchaseLine, PricedPurchaseOrder, PurchaseOrderLineInput, PurchaseOrderService,
    PurchaseOrderStatus, PurchasingError,
};
use depot_shared::types::{OrganizationId, ProductId, PurchaseOrderId, UserId, WarehouseId};

use crate::entities::{
    purchase_order_items, purchase_orders,
    sea_orm_active_enums::PurchaseOrderStatus as DbPurchaseOrderStatus, suppliers,
};
use crate::rls::begin_scoped;

use super::sequence::next_document_number;
use super::stock::{apply_movement, ensure_product, ensure_warehouse};

/// Input for creating a purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    /// Supplier the goods are bought from.
    pub supplier_id: Uuid,
    /// Order date, today if omitted.
    pub order_date: Option<NaiveDate>,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Order lines.
    pub items: Vec<PurchaseOrderLineInput>,
}

/// Patch for a DRAFT purchase order. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePurchaseOrderInput {
    /// New supplier.
    pub supplier_id: Option<Uuid>,
    /// New expected date.
    pub expected_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
    /// New status (ORDERED or CANCELLED).
    pub status: Option<PurchaseOrderStatus>,
    /// Replacement lines.
    pub items: Option<Vec<PurchaseOrderLineInput>>,
}

/// Purchase order with its lines.
#[derive(Debug, Clone)]
pub struct PurchaseOrderWithItems {
    /// Order header.
    pub order: purchase_orders::Model,
    /// Lines ordered by line number.
    pub items: Vec<purchase_order_items::Model>,
}

/// Converts a database status to the core status.
#[must_use]
pub const fn db_status_to_core(status: DbPurchaseOrderStatus) -> PurchaseOrderStatus {
    match status {
        DbPurchaseOrderStatus::Draft => PurchaseOrderStatus::Draft,
        DbPurchaseOrderStatus::Ordered => PurchaseOrderStatus::Ordered,
        DbPurchaseOrderStatus::Received => PurchaseOrderStatus::Received,
        DbPurchaseOrderStatus::Cancelled => PurchaseOrderStatus::Cancelled,
    }
}

/// Converts a core status to the database status.
#[must_use]
pub const fn core_status_to_db(status: PurchaseOrderStatus) -> DbPurchaseOrderStatus {
    match status {
        PurchaseOrderStatus::Draft => DbPurchaseOrderStatus::Draft,
        PurchaseOrderStatus::Ordered => DbPurchaseOrderStatus::Ordered,
        PurchaseOrderStatus::Received => DbPurchaseOrderStatus::Received,
        PurchaseOrderStatus::Cancelled => DbPurchaseOrderStatus::Cancelled,
    }
}

/// Purchase order repository.
#[derive(Clone)]
pub struct PurchaseOrderRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for PurchaseOrderRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseOrderRepository").finish_non_exhaustive()
    }
}

impl PurchaseOrderRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Creates a DRAFT purchase order with a generated number.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are no lines or a line is invalid
    /// - The supplier or a product is not in the organization
    /// - Database operation fails
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, PurchasingError> {
        let priced = PurchaseOrderService::price_lines(&input.items)?;
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        ensure_supplier(&txn, organization_id, input.supplier_id).await?;
        ensure_products(&txn, organization_id, &priced.lines).await?;

        let order_number = next_document_number(
            &txn,
            organization_id,
            DocumentType::PurchaseOrder,
            order_date.year(),
        )
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let now = Utc::now().into();
        let order = purchase_orders::ActiveModel {
            id: Set(PurchaseOrderId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            supplier_id: Set(input.supplier_id),
            order_number: Set(order_number),
            status: Set(DbPurchaseOrderStatus::Draft),
            order_date: Set(order_date),
            expected_date: Set(input.expected_date),
            total_amount: Set(priced.total_amount),
            notes: Set(input.notes),
            received_warehouse_id: Set(None),
            received_at: Set(None),
            received_by: Set(None),
            created_by: Set(actor_id.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let items = insert_items(&txn, order.id, &priced).await?;

        txn.commit()
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            purchase_order_id = %order.id,
            order_number = %order.order_number,
            "Purchase order created"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::CreatePurchaseOrder,
                "PurchaseOrder",
                order.id,
            )
            .with_after(json!({
                "order_number": order.order_number,
                "total_amount": order.total_amount,
                "items": items.len(),
            })),
        );

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Gets a purchase order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order is not in the organization.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        purchase_order_id: PurchaseOrderId,
    ) -> Result<PurchaseOrderWithItems, PurchasingError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let order = find_order(&txn, organization_id, purchase_order_id, false).await?;
        let items = find_items(&txn, order.id).await?;

        txn.commit()
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Lists the organization's purchase orders, newest first.
    ///
    /// Headers only; fetch one order for its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<purchase_orders::Model>, PurchasingError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let orders = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .order_by_desc(purchase_orders::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        Ok(orders)
    }

    /// Patches a DRAFT purchase order.
    ///
    /// Replacing items deletes the old lines and recomputes the total.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The order is not found
    /// - The order is not DRAFT, or the status change is not allowed
    /// - Replacement lines are invalid
    /// - Database operation fails
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        purchase_order_id: PurchaseOrderId,
        input: UpdatePurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, PurchasingError> {
        let priced = input
            .items
            .as_deref()
            .map(PurchaseOrderService::price_lines)
            .transpose()?;

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let order = find_order(&txn, organization_id, purchase_order_id, true).await?;
        let current = db_status_to_core(order.status);
        PurchaseOrderService::ensure_editable(current)?;

        let before = json!({
            "status": current.as_str(),
            "total_amount": order.total_amount,
        });

        let mut active: purchase_orders::ActiveModel = order.clone().into();

        if let Some(status) = input.status {
            let next = PurchaseOrderService::transition(current, status)?;
            active.status = Set(core_status_to_db(next));
        }
        if let Some(supplier_id) = input.supplier_id {
            ensure_supplier(&txn, organization_id, supplier_id).await?;
            active.supplier_id = Set(supplier_id);
        }
        if let Some(expected_date) = input.expected_date {
            active.expected_date = Set(Some(expected_date));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(priced) = &priced {
            ensure_products(&txn, organization_id, &priced.lines).await?;
            purchase_order_items::Entity::delete_many()
                .filter(purchase_order_items::Column::PurchaseOrderId.eq(order.id))
                .exec(&txn)
                .await
                .map_err(|e| PurchasingError::Database(e.to_string()))?;
            insert_items(&txn, order.id, priced).await?;
            active.total_amount = Set(priced.total_amount);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;
        let items = find_items(&txn, updated.id).await?;

        txn.commit()
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            purchase_order_id = %updated.id,
            status = %db_status_to_core(updated.status),
            "Purchase order updated"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::UpdatePurchaseOrder,
                "PurchaseOrder",
                updated.id,
            )
            .with_before(before)
            .with_after(json!({
                "status": db_status_to_core(updated.status).as_str(),
                "total_amount": updated.total_amount,
            })),
        );

        Ok(PurchaseOrderWithItems {
            order: updated,
            items,
        })
    }

    /// Receives a purchase order into a warehouse.
    ///
    /// All-or-nothing: the order becomes RECEIVED and every line is booked
    /// as an IN movement, or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The order is not found
    /// - The order is already RECEIVED or is CANCELLED
    /// - The warehouse or a product is missing, or the warehouse is inactive
    /// - Database operation fails
    pub async fn receive(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        purchase_order_id: PurchaseOrderId,
        warehouse_id: WarehouseId,
    ) -> Result<PurchaseOrderWithItems, PurchasingError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        // Row lock serializes concurrent receives of the same order
        let order = find_order(&txn, organization_id, purchase_order_id, true).await?;
        let previous_status = db_status_to_core(order.status);
        PurchaseOrderService::ensure_receivable(purchase_order_id, previous_status)?;
        ensure_warehouse(&txn, organization_id, warehouse_id).await?;

        let now = Utc::now().into();
        let mut active: purchase_orders::ActiveModel = order.clone().into();
        active.status = Set(DbPurchaseOrderStatus::Received);
        active.received_warehouse_id = Set(Some(warehouse_id.into_inner()));
        active.received_at = Set(Some(now));
        active.received_by = Set(Some(actor_id.into_inner()));
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        let items = find_items(&txn, order.id).await?;
        let lines: Vec<PricedPurchaseLine> = items
            .iter()
            .map(|item| PricedPurchaseLine {
                product_id: ProductId::from_uuid(item.product_id),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
            })
            .collect();

        let movements = PurchaseOrderService::receipt_movements(
            purchase_order_id,
            &order.order_number,
            warehouse_id,
            &lines,
        );
        let mut movement_ids = Vec::with_capacity(movements.len());
        for movement in &movements {
            let applied = apply_movement(&txn, organization_id, actor_id, movement).await?;
            movement_ids.push(applied.movement.id);
        }

        txn.commit()
            .await
            .map_err(|e| PurchasingError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            purchase_order_id = %updated.id,
            warehouse_id = %warehouse_id,
            lines = movement_ids.len(),
            "Purchase order received"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::ReceivePurchaseOrder,
                "PurchaseOrder",
                updated.id,
            )
            .with_before(json!({ "status": previous_status.as_str() }))
            .with_after(json!({ "status": PurchaseOrderStatus::Received.as_str() }))
            .with_metadata(json!({
                "warehouse_id": warehouse_id,
                "movement_ids": movement_ids,
            })),
        );

        Ok(PurchaseOrderWithItems {
            order: updated,
            items,
        })
    }
}

async fn find_order(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    purchase_order_id: PurchaseOrderId,
    lock: bool,
) -> Result<purchase_orders::Model, PurchasingError> {
    let mut query = purchase_orders::Entity::find_by_id(purchase_order_id.into_inner())
        .filter(purchase_orders::Column::OrganizationId.eq(organization_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(txn)
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))?
        .ok_or(PurchasingError::NotFound(purchase_order_id))
}

async fn find_items(
    txn: &DatabaseTransaction,
    purchase_order_id: Uuid,
) -> Result<Vec<purchase_order_items::Model>, PurchasingError> {
    purchase_order_items::Entity::find()
        .filter(purchase_order_items::Column::PurchaseOrderId.eq(purchase_order_id))
        .order_by_asc(purchase_order_items::Column::LineNumber)
        .all(txn)
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))
}

async fn insert_items(
    txn: &DatabaseTransaction,
    purchase_order_id: Uuid,
    priced: &PricedPurchaseOrder,
) -> Result<Vec<purchase_order_items::Model>, PurchasingError> {
    let now = Utc::now().into();
    let mut items = Vec::with_capacity(priced.lines.len());
    for (line_number, line) in (1..).zip(&priced.lines) {
        let item = purchase_order_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            purchase_order_id: Set(purchase_order_id),
            product_id: Set(line.product_id.into_inner()),
            line_number: Set(line_number),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total: Set(line.total),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))?;
        items.push(item);
    }
    Ok(items)
}

async fn ensure_supplier(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    supplier_id: Uuid,
) -> Result<(), PurchasingError> {
    suppliers::Entity::find_by_id(supplier_id)
        .filter(suppliers::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(txn)
        .await
        .map_err(|e| PurchasingError::Database(e.to_string()))?
        .map(|_| ())
        .ok_or(PurchasingError::SupplierNotFound(supplier_id))
}

async fn ensure_products(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    lines: &[PricedPurchaseLine],
) -> Result<(), PurchasingError> {
    for line in lines {
        ensure_product(txn, organization_id, line.product_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_round_trips() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Ordered,
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Cancelled,
        ] {
            assert_eq!(db_status_to_core(core_status_to_db(status)), status);
        }
    }
}
