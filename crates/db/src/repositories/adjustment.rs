//! Stock adjustment repository.
//!
//! Adjustments record a physical count against the on-hand snapshot. They stay
//! editable while DRAFT; approval books one ADJUSTMENT movement per item so
//! each stock row lands exactly on the counted quantity.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use depot_core::adjustment::{
    AdjustmentError, AdjustmentItemInput, AdjustmentService, AdjustmentStatus, CountedItem,
};
use depot_core::audit::{self, AuditAction, AuditEvent, AuditSink};
use depot_core::numbering::DocumentType;
use depot_shared::types::{OrganizationId, ProductId, StockAdjustmentId, UserId, WarehouseId};

use crate::entities::{
    sea_orm_active_enums::StockAdjustmentStatus, stock_adjustment_items, stock_adjustments,
};
use crate::rls::begin_scoped;

use super::sequence::next_document_number;
use super::stock::{
    apply_movement, ensure_product, ensure_stock_row, ensure_warehouse, find_stock, lock_stock,
};

/// Input for creating a stock adjustment.
#[derive(Debug, Clone)]
pub struct CreateAdjustmentInput {
    /// Warehouse that was counted.
    pub warehouse_id: WarehouseId,
    /// Count date, today if omitted.
    pub adjustment_date: Option<NaiveDate>,
    /// Why the count was taken.
    pub reason: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Counted products.
    pub items: Vec<AdjustmentItemInput>,
}

/// Patch for a DRAFT adjustment. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdjustmentInput {
    /// New count date.
    pub adjustment_date: Option<NaiveDate>,
    /// New reason.
    pub reason: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// Replacement items, snapshotted again.
    pub items: Option<Vec<AdjustmentItemInput>>,
}

/// Adjustment with its items.
#[derive(Debug, Clone)]
pub struct AdjustmentWithItems {
    /// Adjustment header.
    pub adjustment: stock_adjustments::Model,
    /// Counted items.
    pub items: Vec<stock_adjustment_items::Model>,
}

/// Converts a database status to the core status.
#[must_use]
pub const fn db_status_to_core(status: StockAdjustmentStatus) -> AdjustmentStatus {
    match status {
        StockAdjustmentStatus::Draft => AdjustmentStatus::Draft,
        StockAdjustmentStatus::Approved => AdjustmentStatus::Approved,
        StockAdjustmentStatus::Cancelled => AdjustmentStatus::Cancelled,
    }
}

/// Stock adjustment repository.
#[derive(Clone)]
pub struct AdjustmentRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for AdjustmentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjustmentRepository").finish_non_exhaustive()
    }
}

impl AdjustmentRepository {
    /// Creates a new adjustment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Creates a DRAFT adjustment, snapshotting the on-hand quantity of each
    /// counted product.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reason is blank, there are no items, or an item is invalid
    /// - The warehouse or a product is not in the organization
    /// - Database operation fails
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        input: CreateAdjustmentInput,
    ) -> Result<AdjustmentWithItems, AdjustmentError> {
        AdjustmentService::validate(&input.reason, &input.items)?;
        let adjustment_date = input
            .adjustment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        ensure_warehouse(&txn, organization_id, input.warehouse_id).await?;

        let adjustment_number = next_document_number(
            &txn,
            organization_id,
            DocumentType::StockAdjustment,
            adjustment_date.year(),
        )
        .await
        .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let now = Utc::now().into();
        let adjustment = stock_adjustments::ActiveModel {
            id: Set(StockAdjustmentId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            warehouse_id: Set(input.warehouse_id.into_inner()),
            adjustment_number: Set(adjustment_number),
            adjustment_date: Set(adjustment_date),
            reason: Set(input.reason.trim().to_string()),
            notes: Set(input.notes),
            status: Set(StockAdjustmentStatus::Draft),
            approved_by: Set(None),
            approved_at: Set(None),
            created_by: Set(actor_id.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let items = insert_counted_items(
            &txn,
            organization_id,
            adjustment.id,
            input.warehouse_id,
            &input.items,
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            adjustment_id = %adjustment.id,
            adjustment_number = %adjustment.adjustment_number,
            items = items.len(),
            "Stock adjustment created"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::CreateStockAdjustment,
                "StockAdjustment",
                adjustment.id,
            )
            .with_after(json!({
                "adjustment_number": adjustment.adjustment_number,
                "warehouse_id": adjustment.warehouse_id,
                "items": items.len(),
            })),
        );

        Ok(AdjustmentWithItems { adjustment, items })
    }

    /// Gets an adjustment with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the adjustment is not in the organization.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        adjustment_id: StockAdjustmentId,
    ) -> Result<AdjustmentWithItems, AdjustmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let adjustment = find_adjustment(&txn, organization_id, adjustment_id, false).await?;
        let items = find_items(&txn, adjustment.id).await?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        Ok(AdjustmentWithItems { adjustment, items })
    }

    /// Lists the organization's adjustments, newest first, without items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<stock_adjustments::Model>, AdjustmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let adjustments = stock_adjustments::Entity::find()
            .filter(stock_adjustments::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(stock_adjustments::Column::CreatedAt)
            .order_by_desc(stock_adjustments::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        Ok(adjustments)
    }

    /// Patches a DRAFT adjustment.
    ///
    /// Supplying items deletes the existing rows and snapshots the on-hand
    /// quantities again.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The adjustment is not found or is not DRAFT
    /// - The new reason is blank or the new items are invalid
    /// - Database operation fails
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        adjustment_id: StockAdjustmentId,
        input: UpdateAdjustmentInput,
    ) -> Result<AdjustmentWithItems, AdjustmentError> {
        if input.reason.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(AdjustmentError::ReasonRequired);
        }
        if let Some(items) = &input.items {
            AdjustmentService::validate_items(items)?;
        }

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let adjustment = find_adjustment(&txn, organization_id, adjustment_id, true).await?;
        AdjustmentService::ensure_draft(db_status_to_core(adjustment.status))?;

        let warehouse_id = WarehouseId::from_uuid(adjustment.warehouse_id);
        let mut active: stock_adjustments::ActiveModel = adjustment.clone().into();

        if let Some(adjustment_date) = input.adjustment_date {
            active.adjustment_date = Set(adjustment_date);
        }
        if let Some(reason) = input.reason {
            active.reason = Set(reason.trim().to_string());
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(items) = &input.items {
            stock_adjustment_items::Entity::delete_many()
                .filter(stock_adjustment_items::Column::AdjustmentId.eq(adjustment.id))
                .exec(&txn)
                .await
                .map_err(|e| AdjustmentError::Database(e.to_string()))?;
            insert_counted_items(&txn, organization_id, adjustment.id, warehouse_id, items)
                .await?;
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;
        let items = find_items(&txn, updated.id).await?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            adjustment_id = %updated.id,
            "Stock adjustment updated"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::UpdateStockAdjustment,
                "StockAdjustment",
                updated.id,
            )
            .with_before(json!({ "reason": adjustment.reason, "notes": adjustment.notes }))
            .with_after(json!({
                "reason": updated.reason,
                "notes": updated.notes,
                "items": items.len(),
            })),
        );

        Ok(AdjustmentWithItems {
            adjustment: updated,
            items,
        })
    }

    /// Deletes a DRAFT adjustment. Nothing was booked, so stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the adjustment is not found or is not DRAFT.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        adjustment_id: StockAdjustmentId,
    ) -> Result<(), AdjustmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let adjustment = find_adjustment(&txn, organization_id, adjustment_id, true).await?;
        AdjustmentService::ensure_draft(db_status_to_core(adjustment.status))?;

        let adjustment_number = adjustment.adjustment_number.clone();
        adjustment
            .delete(&txn)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            adjustment_id = %adjustment_id,
            "Stock adjustment deleted"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::DeleteStockAdjustment,
                "StockAdjustment",
                adjustment_id.into_inner(),
            )
            .with_before(json!({ "adjustment_number": adjustment_number })),
        );

        Ok(())
    }

    /// Approves a DRAFT adjustment and books it.
    ///
    /// Each item's stock row is locked and the delta is taken against the
    /// locked quantity, so every row ends exactly on the counted quantity.
    /// The stored snapshot is refreshed to match the booked movement. Any
    /// failure rolls back the whole approval.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The adjustment is not found or is not DRAFT
    /// - The warehouse became inactive or a product disappeared
    /// - Database operation fails
    pub async fn approve(
        &self,
        organization_id: OrganizationId,
        approver_id: UserId,
        adjustment_id: StockAdjustmentId,
    ) -> Result<AdjustmentWithItems, AdjustmentError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        let adjustment = find_adjustment(&txn, organization_id, adjustment_id, true).await?;
        let approval =
            AdjustmentService::approve(db_status_to_core(adjustment.status), approver_id)?;

        let warehouse_id = WarehouseId::from_uuid(adjustment.warehouse_id);
        ensure_warehouse(&txn, organization_id, warehouse_id).await?;

        let items = find_items(&txn, adjustment.id).await?;
        let mut booked = Vec::with_capacity(items.len());
        for item in items {
            let product_id = ProductId::from_uuid(item.product_id);
            ensure_product(&txn, organization_id, product_id).await?;
            ensure_stock_row(&txn, organization_id, product_id, warehouse_id).await?;
            let on_hand = lock_stock(&txn, organization_id, product_id, warehouse_id)
                .await?
                .map(|s| s.quantity);

            let counted = CountedItem {
                product_id,
                system_quantity: item.system_quantity,
                actual_quantity: item.actual_quantity,
                difference: item.difference,
                note: item.note.clone(),
            };
            let movement = AdjustmentService::approval_movement(
                adjustment_id,
                &adjustment.adjustment_number,
                warehouse_id,
                &counted,
                on_hand,
            );
            let applied = apply_movement(&txn, organization_id, approver_id, &movement).await?;

            let mut active: stock_adjustment_items::ActiveModel = item.into();
            active.system_quantity = Set(applied.movement.previous_quantity);
            active.difference = Set(movement.quantity);
            let item = active
                .update(&txn)
                .await
                .map_err(|e| AdjustmentError::Database(e.to_string()))?;
            booked.push(item);
        }

        let approved_at: DateTimeWithTimeZone = approval.approved_at.into();
        let mut active: stock_adjustments::ActiveModel = adjustment.into();
        active.status = Set(StockAdjustmentStatus::Approved);
        active.approved_by = Set(Some(approval.approved_by.into_inner()));
        active.approved_at = Set(Some(approved_at));
        active.updated_at = Set(approved_at);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AdjustmentError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            adjustment_id = %updated.id,
            approved_by = %approver_id,
            items = booked.len(),
            "Stock adjustment approved"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                approver_id,
                AuditAction::ApproveStockAdjustment,
                "StockAdjustment",
                updated.id,
            )
            .with_before(json!({ "status": AdjustmentStatus::Draft.as_str() }))
            .with_after(json!({ "status": AdjustmentStatus::Approved.as_str() }))
            .with_metadata(json!({
                "differences": booked
                    .iter()
                    .map(|i| json!({ "product_id": i.product_id, "difference": i.difference }))
                    .collect::<Vec<_>>(),
            })),
        );

        Ok(AdjustmentWithItems {
            adjustment: updated,
            items: booked,
        })
    }
}

async fn find_adjustment(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    adjustment_id: StockAdjustmentId,
    lock: bool,
) -> Result<stock_adjustments::Model, AdjustmentError> {
    let mut query = stock_adjustments::Entity::find_by_id(adjustment_id.into_inner())
        .filter(stock_adjustments::Column::OrganizationId.eq(organization_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(txn)
        .await
        .map_err(|e| AdjustmentError::Database(e.to_string()))?
        .ok_or(AdjustmentError::NotFound(adjustment_id))
}

async fn find_items(
    txn: &DatabaseTransaction,
    adjustment_id: Uuid,
) -> Result<Vec<stock_adjustment_items::Model>, AdjustmentError> {
    stock_adjustment_items::Entity::find()
        .filter(stock_adjustment_items::Column::AdjustmentId.eq(adjustment_id))
        .order_by_asc(stock_adjustment_items::Column::CreatedAt)
        .order_by_asc(stock_adjustment_items::Column::Id)
        .all(txn)
        .await
        .map_err(|e| AdjustmentError::Database(e.to_string()))
}

async fn insert_counted_items(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    adjustment_id: Uuid,
    warehouse_id: WarehouseId,
    items: &[AdjustmentItemInput],
) -> Result<Vec<stock_adjustment_items::Model>, AdjustmentError> {
    let now = Utc::now().into();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        ensure_product(txn, organization_id, item.product_id).await?;
        let snapshot = find_stock(txn, organization_id, item.product_id, warehouse_id)
            .await?
            .map(|s| s.quantity);
        let counted = AdjustmentService::count(item, snapshot);

        let row = stock_adjustment_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            adjustment_id: Set(adjustment_id),
            product_id: Set(counted.product_id.into_inner()),
            system_quantity: Set(counted.system_quantity),
            actual_quantity: Set(counted.actual_quantity),
            difference: Set(counted.difference),
            note: Set(counted.note),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|e| AdjustmentError::Database(e.to_string()))?;
        rows.push(row);
    }
    Ok(rows)
}
