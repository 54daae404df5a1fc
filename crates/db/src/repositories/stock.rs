//! Stock ledger repository.
//!
//! [`apply_movement`] is the only code path that writes `stocks` or
//! `stock_movements`. Workflow repositories call it inside their own
//! transaction; [`StockLedgerRepository`] wraps it for manual movements and
//! serves the read side.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use depot_core::audit::{self, AuditAction, AuditEvent, AuditSink};
use depot_core::ledger::{LedgerError, MovementRequest, MovementType, StockLedger};
use depot_shared::types::{OrganizationId, ProductId, UserId, WarehouseId};

use crate::entities::{
    products, sea_orm_active_enums::StockMovementType, stock_movements, stocks, warehouses,
};
use crate::rls::begin_scoped;

/// Default number of movements returned by [`StockLedgerRepository::list_movements`].
pub const DEFAULT_MOVEMENT_LIMIT: u64 = 50;

/// Upper bound on movements returned by one history query.
pub const MAX_MOVEMENT_LIMIT: u64 = 500;

/// A stock row after a movement, with the movement record written for it.
#[derive(Debug, Clone)]
pub struct StockMovementResult {
    /// Updated stock row.
    pub stock: stocks::Model,
    /// Movement record.
    pub movement: stock_movements::Model,
}

/// Filter options for movement history.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Only movements for this product.
    pub product_id: Option<ProductId>,
    /// Only movements in this warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Only movements caused by this record.
    pub reference_id: Option<Uuid>,
    /// Maximum rows, newest first. Capped at [`MAX_MOVEMENT_LIMIT`].
    pub limit: Option<u64>,
}

impl MovementFilter {
    /// Row limit the query actually uses.
    #[must_use]
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_MOVEMENT_LIMIT)
            .min(MAX_MOVEMENT_LIMIT)
    }
}

/// Converts a ledger movement type to its database enum.
#[must_use]
pub const fn movement_type_to_db(movement_type: MovementType) -> StockMovementType {
    match movement_type {
        MovementType::In => StockMovementType::In,
        MovementType::Out => StockMovementType::Out,
        MovementType::TransferIn => StockMovementType::TransferIn,
        MovementType::TransferOut => StockMovementType::TransferOut,
        MovementType::Adjustment => StockMovementType::Adjustment,
    }
}

/// Converts a database movement type to the ledger enum.
#[must_use]
pub const fn db_movement_type_to_core(movement_type: StockMovementType) -> MovementType {
    match movement_type {
        StockMovementType::In => MovementType::In,
        StockMovementType::Out => MovementType::Out,
        StockMovementType::TransferIn => MovementType::TransferIn,
        StockMovementType::TransferOut => MovementType::TransferOut,
        StockMovementType::Adjustment => MovementType::Adjustment,
    }
}

/// Reads the stock row for a product in a warehouse without locking it.
///
/// # Errors
///
/// Returns `LedgerError::Database` if the query fails.
pub async fn find_stock(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<stocks::Model>, LedgerError> {
    stocks::Entity::find()
        .filter(stocks::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(stocks::Column::ProductId.eq(product_id.into_inner()))
        .filter(stocks::Column::WarehouseId.eq(warehouse_id.into_inner()))
        .one(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))
}

/// Reads and row-locks the stock row until the transaction ends.
///
/// # Errors
///
/// Returns `LedgerError::Database` if the query fails.
pub async fn lock_stock(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<Option<stocks::Model>, LedgerError> {
    stocks::Entity::find()
        .filter(stocks::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(stocks::Column::ProductId.eq(product_id.into_inner()))
        .filter(stocks::Column::WarehouseId.eq(warehouse_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))
}

/// Checks that a warehouse exists in the organization and is active.
///
/// # Errors
///
/// - `WarehouseNotFound` if absent or owned by another organization
/// - `WarehouseInactive` if deactivated
pub async fn ensure_warehouse(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    warehouse_id: WarehouseId,
) -> Result<warehouses::Model, LedgerError> {
    let warehouse = warehouses::Entity::find_by_id(warehouse_id.into_inner())
        .filter(warehouses::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?
        .ok_or(LedgerError::WarehouseNotFound(warehouse_id))?;

    if !warehouse.is_active {
        return Err(LedgerError::WarehouseInactive(warehouse_id));
    }
    Ok(warehouse)
}

/// Checks that a product exists in the organization.
///
/// # Errors
///
/// Returns `ProductNotFound` if absent or owned by another organization.
pub async fn ensure_product(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    product_id: ProductId,
) -> Result<products::Model, LedgerError> {
    products::Entity::find_by_id(product_id.into_inner())
        .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?
        .ok_or(LedgerError::ProductNotFound(product_id))
}

/// Creates a zero-quantity stock row unless one already exists.
///
/// Safe under concurrency: a row inserted by another transaction wins and
/// this call becomes a no-op.
///
/// # Errors
///
/// Returns `LedgerError::Database` if the insert fails.
pub async fn ensure_stock_row(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> Result<(), LedgerError> {
    let now = Utc::now().into();
    let row = stocks::ActiveModel {
        id: Set(Uuid::now_v7()),
        organization_id: Set(organization_id.into_inner()),
        product_id: Set(product_id.into_inner()),
        warehouse_id: Set(warehouse_id.into_inner()),
        quantity: Set(Decimal::ZERO),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    stocks::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([stocks::Column::ProductId, stocks::Column::WarehouseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;
    Ok(())
}

/// Applies one movement inside the caller's transaction.
///
/// Locks the stock row, applies the ledger rules, bumps the row version and
/// appends exactly one movement record. Nothing is written when an error is
/// returned; the caller drops the transaction.
///
/// # Errors
///
/// - `InvalidQuantity` for a non-positive IN/OUT/TRANSFER quantity
/// - `InvalidPrecision` for a quantity or unit cost beyond 4 decimal places
/// - `ProductNotFound`, `WarehouseNotFound`, `WarehouseInactive`
/// - `StockNotFound` or `InsufficientStock` for outbound movements
/// - `ConcurrentModification` if the row version changed under the lock
/// - `Database` on query failure
pub async fn apply_movement(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor_id: UserId,
    request: &MovementRequest,
) -> Result<StockMovementResult, LedgerError> {
    StockLedger::validate(request)?;

    let product_id = request.key.product_id;
    let warehouse_id = request.key.warehouse_id;

    ensure_product(txn, organization_id, product_id).await?;
    ensure_warehouse(txn, organization_id, warehouse_id).await?;

    let now: DateTimeWithTimeZone = Utc::now().into();

    // Rows are created lazily by the first inbound movement
    if request.signed_delta() >= Decimal::ZERO {
        ensure_stock_row(txn, organization_id, product_id, warehouse_id).await?;
    }

    let current = lock_stock(txn, organization_id, product_id, warehouse_id).await?;
    let applied = StockLedger::apply(current.as_ref().map(|s| s.quantity), request)?;
    let Some(stock) = current else {
        return Err(LedgerError::StockNotFound {
            product_id,
            warehouse_id,
        });
    };

    let result = stocks::Entity::update_many()
        .col_expr(stocks::Column::Quantity, Expr::value(applied.new_quantity))
        .col_expr(stocks::Column::Version, Expr::value(stock.version + 1))
        .col_expr(stocks::Column::UpdatedAt, Expr::value(now))
        .filter(stocks::Column::Id.eq(stock.id))
        .filter(stocks::Column::Version.eq(stock.version))
        .exec(txn)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

    if result.rows_affected == 0 {
        return Err(LedgerError::ConcurrentModification {
            product_id,
            warehouse_id,
        });
    }

    let movement = stock_movements::ActiveModel {
        id: Set(Uuid::now_v7()),
        organization_id: Set(organization_id.into_inner()),
        product_id: Set(product_id.into_inner()),
        warehouse_id: Set(warehouse_id.into_inner()),
        movement_type: Set(movement_type_to_db(request.movement_type)),
        quantity: Set(request.quantity),
        previous_quantity: Set(applied.previous_quantity),
        new_quantity: Set(applied.new_quantity),
        reference_type: Set(request.reference.reference_type().to_string()),
        reference_id: Set(request.reference.reference_id()),
        unit_cost: Set(request.unit_cost),
        note: Set(request.note.clone()),
        created_by: Set(actor_id.into_inner()),
        created_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(|e| LedgerError::Database(e.to_string()))?;

    tracing::debug!(
        organization_id = %organization_id,
        product_id = %product_id,
        warehouse_id = %warehouse_id,
        movement_type = %request.movement_type,
        previous = %applied.previous_quantity,
        new = %applied.new_quantity,
        "Stock movement applied"
    );

    Ok(StockMovementResult {
        stock: stocks::Model {
            quantity: applied.new_quantity,
            version: stock.version + 1,
            updated_at: now,
            ..stock
        },
        movement,
    })
}

/// Stock ledger repository.
#[derive(Clone)]
pub struct StockLedgerRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for StockLedgerRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockLedgerRepository").finish_non_exhaustive()
    }
}

impl StockLedgerRepository {
    /// Creates a new stock ledger repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Gets the stock row for a product in a warehouse.
    ///
    /// `None` means nothing was ever received there, i.e. zero on hand.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_stock(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<stocks::Model>, LedgerError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let stock = find_stock(&txn, organization_id, product_id, warehouse_id).await?;
        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(stock)
    }

    /// Applies a manual movement in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`apply_movement`].
    pub async fn adjust_stock(
        &self,
        organization_id: OrganizationId,
        actor_id: UserId,
        request: &MovementRequest,
    ) -> Result<StockMovementResult, LedgerError> {
        StockLedger::validate(request)?;

        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let result = apply_movement(&txn, organization_id, actor_id, request).await?;

        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        tracing::info!(
            organization_id = %organization_id,
            movement_id = %result.movement.id,
            quantity = %result.stock.quantity,
            "Manual stock movement recorded"
        );

        audit::emit(
            self.audit.as_ref(),
            &AuditEvent::new(
                organization_id,
                actor_id,
                AuditAction::AdjustStock,
                "Stock",
                result.stock.id,
            )
            .with_before(json!({ "quantity": result.movement.previous_quantity }))
            .with_after(json!({ "quantity": result.movement.new_quantity }))
            .with_metadata(json!({
                "movement_id": result.movement.id,
                "movement_type": request.movement_type.as_str(),
                "note": request.note,
            })),
        );

        Ok(result)
    }

    /// Lists movement history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_movements(
        &self,
        organization_id: OrganizationId,
        filter: &MovementFilter,
    ) -> Result<Vec<stock_movements::Model>, LedgerError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut query = stock_movements::Entity::find()
            .filter(stock_movements::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_movements::Column::ProductId.eq(product_id.into_inner()));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query =
                query.filter(stock_movements::Column::WarehouseId.eq(warehouse_id.into_inner()));
        }
        if let Some(reference_id) = filter.reference_id {
            query = query.filter(stock_movements::Column::ReferenceId.eq(reference_id));
        }

        let movements = query
            .order_by_desc(stock_movements::Column::CreatedAt)
            .order_by_desc(stock_movements::Column::Id)
            .limit(filter.effective_limit())
            .all(&txn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(movements)
    }

    /// Lists stock rows whose quantity is below `threshold`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn low_stock(
        &self,
        organization_id: OrganizationId,
        threshold: Decimal,
    ) -> Result<Vec<stocks::Model>, LedgerError> {
        let txn = begin_scoped(&self.db, organization_id)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let rows = stocks::Entity::find()
            .filter(stocks::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(stocks::Column::Quantity.lt(threshold))
            .order_by_asc(stocks::Column::Quantity)
            .all(&txn)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(rows)
    }
}
