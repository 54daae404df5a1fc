//! Concurrent access tests for the stock ledger.
//!
//! These tests verify that:
//! - Concurrent outbound movements never drive a stock row negative
//! - Every successful movement is counted exactly once (no lost updates)
//! - A purchase order received concurrently is booked once
//! - Document numbers stay unique under concurrent creation
//! - Concurrent replays of a paid invoice create one sales order

#![allow(clippy::uninlined_format_args)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tokio::sync::Barrier;
use uuid::Uuid;

use depot_core::audit::{AuditAction, MemoryAuditSink};
use depot_core::fulfillment::{InvoiceLine, InvoicePaid};
use depot_core::ledger::{LedgerError, MovementType};
use depot_core::purchasing::{PurchaseOrderLineInput, PurchasingError};
use depot_db::entities::{sales_order_items, sales_orders, stock_movements};
use depot_db::repositories::{
    CreatePurchaseOrderInput, FulfillmentRepository, PurchaseOrderRepository,
};
use depot_shared::types::PurchaseOrderId;

use common::{cleanup, connect, ledger, manual, on_hand, seed_stock, setup};

const TASKS: usize = 20;

#[tokio::test]
async fn test_concurrent_outbound_never_oversells() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(setup(&db).await);

    seed_stock(&db, &fx, fx.product, dec!(10)).await;

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let db = db.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let repo = ledger(&db, &MemoryAuditSink::new());
            barrier.wait().await;
            repo.adjust_stock(
                fx.org,
                fx.user,
                &manual(fx.product, fx.warehouse, MovementType::Out, dec!(1)),
            )
            .await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientStock { .. })))
        .count();

    assert_eq!(successes, 10, "results: {:?}", results);
    assert_eq!(insufficient, TASKS - 10);
    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(Decimal::ZERO));

    let movements = stock_movements::Entity::find()
        .filter(stock_movements::Column::OrganizationId.eq(fx.org.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(movements, 11);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_concurrent_first_receipts_share_one_row() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(setup(&db).await);

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let db = db.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let repo = ledger(&db, &MemoryAuditSink::new());
            barrier.wait().await;
            repo.adjust_stock(
                fx.org,
                fx.user,
                &manual(fx.product, fx.warehouse, MovementType::In, dec!(2.5)),
            )
            .await
        })
    });

    for joined in join_all(handles).await {
        joined.expect("task panicked").unwrap();
    }

    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(50)));

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_concurrent_receive_books_once() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(setup(&db).await);
    let repo = PurchaseOrderRepository::new(db.clone(), Arc::new(MemoryAuditSink::new()));

    let created = repo
        .create(
            fx.org,
            fx.user,
            CreatePurchaseOrderInput {
                supplier_id: fx.supplier_id,
                order_date: None,
                expected_date: None,
                notes: None,
                items: vec![PurchaseOrderLineInput {
                    product_id: fx.product,
                    quantity: dec!(7),
                    unit_price: dec!(1),
                }],
            },
        )
        .await
        .unwrap();
    let po_id = PurchaseOrderId::from_uuid(created.order.id);

    let tasks = 5;
    let barrier = Arc::new(Barrier::new(tasks));
    let handles = (0..tasks).map(|_| {
        let repo = repo.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.receive(fx.org, fx.user, po_id, fx.warehouse).await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(PurchasingError::AlreadyReceived(_))))
            .count(),
        tasks - 1
    );
    assert_eq!(on_hand(&db, &fx, fx.product).await, Some(dec!(7)));

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_concurrent_numbering_is_unique() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(setup(&db).await);
    let repo = PurchaseOrderRepository::new(db.clone(), Arc::new(MemoryAuditSink::new()));

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let repo = repo.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.create(
                fx.org,
                fx.user,
                CreatePurchaseOrderInput {
                    supplier_id: fx.supplier_id,
                    order_date: None,
                    expected_date: None,
                    notes: None,
                    items: vec![PurchaseOrderLineInput {
                        product_id: fx.product,
                        quantity: dec!(1),
                        unit_price: dec!(1),
                    }],
                },
            )
            .await
        })
    });

    let numbers: HashSet<String> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").unwrap().order.order_number)
        .collect();
    assert_eq!(numbers.len(), TASKS);

    cleanup(&db, fx.org).await;
}

#[tokio::test]
async fn test_concurrent_invoice_replays_create_one_order() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(setup(&db).await);
    let sink = MemoryAuditSink::new();
    let repo = FulfillmentRepository::new(db.clone(), Arc::new(sink.clone()));

    let rounds = 5;
    let tasks = 8;
    for round in 0..rounds {
        let event = Arc::new(InvoicePaid {
            invoice_id: Uuid::new_v4(),
            invoice_number: format!("INV-{:04}", round),
            customer_id: Uuid::new_v4(),
            paid_at: Utc::now(),
            shipping_address: None,
            lines: vec![InvoiceLine {
                product_id: Some(fx.product),
                quantity: dec!(3),
                unit_price: dec!(4),
                tax_amount: dec!(0),
                discount_amount: dec!(0),
            }],
        });

        let barrier = Arc::new(Barrier::new(tasks));
        let handles = (0..tasks).map(|_| {
            let repo = repo.clone();
            let fx = Arc::clone(&fx);
            let event = Arc::clone(&event);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                repo.create_from_invoice_paid(fx.org, fx.user, &event).await
            })
        });

        let order_ids: HashSet<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined
                    .expect("task panicked")
                    .expect("replay failed")
                    .expect("invoice has product lines")
                    .order
                    .id
            })
            .collect();
        assert_eq!(order_ids.len(), 1, "round {}: {:?}", round, order_ids);

        let orders = sales_orders::Entity::find()
            .filter(sales_orders::Column::OrganizationId.eq(fx.org.into_inner()))
            .filter(sales_orders::Column::SourceInvoiceId.eq(event.invoice_id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);

        let items = sales_order_items::Entity::find()
            .filter(sales_order_items::Column::SalesOrderId.eq(orders[0].id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(items, 1);
    }

    assert_eq!(sink.events_with(AuditAction::CreateSalesOrder).len(), rounds);

    cleanup(&db, fx.org).await;
}
