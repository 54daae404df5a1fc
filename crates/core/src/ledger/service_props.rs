//! Property-based tests for StockLedger.
//!
//! A sequence of movements is folded over a single stock row the way the
//! database layer applies them: failed movements leave the row untouched and
//! write no record.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::service::StockLedger;
use crate::ledger::types::{MovementReference, MovementRequest, MovementType, StockKey};
use depot_shared::types::{ProductId, WarehouseId};

/// Strategy for generating movement types.
fn arb_movement_type() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::In),
        Just(MovementType::Out),
        Just(MovementType::TransferIn),
        Just(MovementType::TransferOut),
    ]
}

/// Strategy for generating positive quantities with up to 3 decimal places.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 3))
}

/// Strategy for generating non-negative counted quantities.
fn arb_count() -> impl Strategy<Value = Decimal> {
    (0i64..100_000i64).prop_map(|n| Decimal::new(n, 3))
}

fn arb_movements() -> impl Strategy<Value = Vec<(MovementType, Decimal)>> {
    prop::collection::vec((arb_movement_type(), arb_quantity()), 1..40)
}

struct Row {
    quantity: Option<Decimal>,
    records: Vec<(MovementType, Decimal)>,
}

fn run(key: StockKey, movements: &[(MovementType, Decimal)]) -> Row {
    let mut row = Row {
        quantity: None,
        records: Vec::new(),
    };
    for (movement_type, quantity) in movements {
        let request = MovementRequest::new(key, *movement_type, *quantity, MovementReference::Manual);
        if let Ok(applied) = StockLedger::apply(row.quantity, &request) {
            row.quantity = Some(applied.new_quantity);
            row.records.push((*movement_type, *quantity));
        }
    }
    row
}

fn key() -> StockKey {
    StockKey::new(ProductId::new(), WarehouseId::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Final quantity equals inbound minus outbound over the recorded movements.
    #[test]
    fn prop_conservation(movements in arb_movements()) {
        let row = run(key(), &movements);

        let inbound: Decimal = row.records.iter()
            .filter(|(t, _)| t.is_inbound())
            .map(|(_, q)| *q)
            .sum();
        let outbound: Decimal = row.records.iter()
            .filter(|(t, _)| t.is_outbound())
            .map(|(_, q)| *q)
            .sum();

        prop_assert_eq!(row.quantity.unwrap_or(Decimal::ZERO), inbound - outbound);
    }

    /// The quantity never goes below zero.
    #[test]
    fn prop_never_negative(movements in arb_movements()) {
        let key = key();
        let mut quantity = None;
        for (movement_type, q) in movements {
            let request = MovementRequest::new(key, movement_type, q, MovementReference::Manual);
            if let Ok(applied) = StockLedger::apply(quantity, &request) {
                prop_assert!(applied.new_quantity >= Decimal::ZERO);
                quantity = Some(applied.new_quantity);
            }
        }
    }

    /// Outbound beyond the available quantity fails and reports both numbers.
    #[test]
    fn prop_outbound_beyond_available_rejected(
        available in arb_count(),
        extra in arb_quantity(),
    ) {
        let requested = available + extra;
        let request = MovementRequest::new(key(), MovementType::Out, requested, MovementReference::Manual);
        let result = StockLedger::apply(Some(available), &request);
        match result {
            Err(LedgerError::InsufficientStock { available: a, requested: r }) => {
                prop_assert_eq!(a, available);
                prop_assert_eq!(r, requested);
            }
            other => prop_assert!(false, "expected InsufficientStock, got {:?}", other),
        }
    }

    /// Inbound movements always succeed and add exactly their quantity.
    #[test]
    fn prop_inbound_adds(current in proptest::option::of(arb_count()), q in arb_quantity()) {
        let request = MovementRequest::new(key(), MovementType::In, q, MovementReference::Manual);
        let applied = StockLedger::apply(current, &request).unwrap();
        prop_assert_eq!(applied.new_quantity, current.unwrap_or(Decimal::ZERO) + q);
        prop_assert_eq!(applied.creates_stock, current.is_none());
    }

    /// Applying the delta to a count always lands on the counted quantity.
    #[test]
    fn prop_adjustment_converges(current in proptest::option::of(arb_count()), actual in arb_count()) {
        let delta = StockLedger::delta_to(current, actual);
        let request = MovementRequest::new(key(), MovementType::Adjustment, delta, MovementReference::Manual);
        let applied = StockLedger::apply(current, &request).unwrap();
        prop_assert_eq!(applied.new_quantity, actual);
        prop_assert_eq!(applied.delta, delta);
    }
}
