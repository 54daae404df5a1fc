//! Stock ledger integration tests.
//!
//! Exercises `apply_movement` through the manual adjust path: conservation,
//! non-negativity, lazy row creation and movement history.

#![allow(clippy::uninlined_format_args)]

mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use depot_core::audit::{AuditAction, MemoryAuditSink};
use depot_core::ledger::{LedgerError, MovementType};
use depot_db::entities::{sea_orm_active_enums::StockMovementType, stock_movements};
use depot_db::repositories::MovementFilter;

use common::{cleanup, connect, insert_warehouse, ledger, manual, on_hand, setup};

#[tokio::test]
async fn test_inbound_creates_row_and_outbound_conserves() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let sink = MemoryAuditSink::new();
    let repo = ledger(&db, &sink);

    assert_eq!(on_hand(&db, &fx, fx.product).await, None);

    let first = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(10)))
        .await
        .unwrap();
    assert_eq!(first.stock.quantity, dec!(10));
    assert_eq!(first.movement.previous_quantity, dec!(0));
    assert_eq!(first.movement.new_quantity, dec!(10));
    assert_eq!(first.movement.reference_type, "Manual");

    repo.adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(2.5)))
        .await
        .unwrap();
    let out = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::Out, dec!(4)))
        .await
        .unwrap();
    assert_eq!(out.movement.movement_type, StockMovementType::Out);
    assert_eq!(out.movement.quantity, dec!(4));
    assert_eq!(out.stock.quantity, dec!(8.5));

    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(8.5)));

    let count = stock_movements::Entity::find()
        .filter(stock_movements::Column::OrganizationId.eq(fx.org.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(sink.events_with(AuditAction::AdjustStock).len(), 3);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_insufficient_stock_writes_nothing() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let sink = MemoryAuditSink::new();
    let repo = ledger(&db, &sink);

    repo.adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(3)))
        .await
        .unwrap();

    let err = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::Out, dec!(5)))
        .await
        .unwrap_err();
    match err {
        LedgerError::InsufficientStock { available, requested } => {
            assert_eq!(available, dec!(3));
            assert_eq!(requested, dec!(5));
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(3)));
    let count = stock_movements::Entity::find()
        .filter(stock_movements::Column::OrganizationId.eq(fx.org.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(sink.events_with(AuditAction::AdjustStock).len(), 1);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_sub_scale_quantities_rejected_without_writes() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let sink = MemoryAuditSink::new();
    let repo = ledger(&db, &sink);

    let tiny = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(0.00001)))
        .await;
    assert!(matches!(tiny, Err(LedgerError::InvalidPrecision { field: "quantity", .. })));
    assert_eq!(on_hand(&db, &fx, fx.product).await, None);

    repo.adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(2)))
        .await
        .unwrap();
    let rounded = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::Out, dec!(1.00005)))
        .await;
    assert!(matches!(rounded, Err(LedgerError::InvalidPrecision { .. })));
    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(2)));

    let count = stock_movements::Entity::find()
        .filter(stock_movements::Column::OrganizationId.eq(fx.org.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(sink.events_with(AuditAction::AdjustStock).len(), 1);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_outbound_without_row_is_stock_not_found() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let repo = ledger(&db, &MemoryAuditSink::new());

    let result = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::Out, dec!(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::StockNotFound { .. })));
    assert_eq!(on_hand(&db, &fx, fx.product).await, None);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_adjustment_delta_and_validation() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let repo = ledger(&db, &MemoryAuditSink::new());

    repo.adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(50)))
        .await
        .unwrap();
    let adjusted = repo
        .adjust_stock(
            fx.org,
            fx.user,
            &manual(fx.product, fx.warehouse, MovementType::Adjustment, dec!(-8)),
        )
        .await
        .unwrap();
    assert_eq!(adjusted.stock.quantity, dec!(42));
    assert_eq!(adjusted.movement.quantity, dec!(-8));

    let zero_in = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, dec!(0)))
        .await;
    assert!(matches!(zero_in, Err(LedgerError::InvalidQuantity { .. })));

    let too_far = repo
        .adjust_stock(
            fx.org,
            fx.user,
            &manual(fx.product, fx.warehouse, MovementType::Adjustment, dec!(-43)),
        )
        .await;
    assert!(matches!(too_far, Err(LedgerError::InsufficientStock { .. })));
    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(42)));

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_unknown_or_inactive_targets_rejected() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let other = setup(&db).await;
    let repo = ledger(&db, &MemoryAuditSink::new());

    // Product belonging to another organization
    let result = repo
        .adjust_stock(fx.org, fx.user, &manual(other.product, fx.warehouse, MovementType::In, dec!(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::ProductNotFound(_))));

    let result = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, other.warehouse, MovementType::In, dec!(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::WarehouseNotFound(_))));

    let closed = insert_warehouse(&db, fx.org, "CLOSED", false).await;
    let result = repo
        .adjust_stock(fx.org, fx.user, &manual(fx.product, closed, MovementType::In, dec!(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::WarehouseInactive(_))));

    cleanup(&db, fx.org).await;
    cleanup(&db, other.org).await;
}

#[tokio::test]
async fn test_movement_history_and_low_stock() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await;
    let repo = ledger(&db, &MemoryAuditSink::new());

    for quantity in [dec!(1), dec!(2), dec!(3)] {
        repo.adjust_stock(fx.org, fx.user, &manual(fx.product, fx.warehouse, MovementType::In, quantity))
            .await
            .unwrap();
    }
    repo.adjust_stock(
        fx.org,
        fx.user,
        &manual(fx.other_product, fx.warehouse, MovementType::In, dec!(100)),
    )
    .await
    .unwrap();

    let history = repo
        .list_movements(
            fx.org,
            &MovementFilter {
                product_id: Some(fx.product),
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].quantity, dec!(3));
    assert_eq!(history[1].quantity, dec!(2));

    let all = repo
        .list_movements(fx.org, &MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);

    let low = repo.low_stock(fx.org, dec!(10)).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].product_id, fx.product.into_inner());
    assert_eq!(low[0].quantity, dec!(6));

    cleanup(&db, fx.org).await;
}
