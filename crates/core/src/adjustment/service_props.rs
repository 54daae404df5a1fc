//! Property-based tests for AdjustmentService.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::adjustment::service::AdjustmentService;
use crate::adjustment::types::{AdjustmentItemInput, AdjustmentStatus};
use crate::ledger::StockLedger;
use depot_shared::types::{ProductId, StockAdjustmentId, UserId, WarehouseId};

fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

fn arb_status() -> impl Strategy<Value = AdjustmentStatus> {
    prop_oneof![
        Just(AdjustmentStatus::Draft),
        Just(AdjustmentStatus::Approved),
        Just(AdjustmentStatus::Cancelled),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// snapshot + difference == actual for every counted line.
    #[test]
    fn prop_difference_is_actual_minus_system(
        system in proptest::option::of(arb_quantity()),
        actual in arb_quantity(),
    ) {
        let item = AdjustmentItemInput { product_id: ProductId::new(), actual_quantity: actual, note: None };
        let counted = AdjustmentService::count(&item, system);
        prop_assert_eq!(counted.system_quantity + counted.difference, actual);
    }

    /// Approving lands the stock row on the counted quantity whatever it was before.
    #[test]
    fn prop_approval_converges(
        system in proptest::option::of(arb_quantity()),
        on_hand in proptest::option::of(arb_quantity()),
        actual in arb_quantity(),
    ) {
        let item = AdjustmentItemInput { product_id: ProductId::new(), actual_quantity: actual, note: None };
        let counted = AdjustmentService::count(&item, system);
        let movement = AdjustmentService::approval_movement(
            StockAdjustmentId::new(),
            "ADJ-2026-000001",
            WarehouseId::new(),
            &counted,
            on_hand,
        );
        let applied = StockLedger::apply(on_hand, &movement).unwrap();
        prop_assert_eq!(applied.new_quantity, actual);
    }

    /// Only DRAFT adjustments can be approved.
    #[test]
    fn prop_approve_requires_draft(status in arb_status()) {
        let result = AdjustmentService::approve(status, UserId::new());
        prop_assert_eq!(result.is_ok(), status == AdjustmentStatus::Draft);
    }
}
