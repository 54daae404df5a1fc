//! Property-based tests for PurchaseOrderService.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::purchasing::error::PurchasingError;
use crate::purchasing::service::PurchaseOrderService;
use crate::purchasing::types::{PurchaseOrderLineInput, PurchaseOrderStatus};
use depot_shared::types::{ProductId, PurchaseOrderId};

fn arb_line() -> impl Strategy<Value = PurchaseOrderLineInput> {
    ((1i64..10_000i64), (0i64..1_000_000i64)).prop_map(|(q, p)| PurchaseOrderLineInput {
        product_id: ProductId::new(),
        quantity: Decimal::new(q, 2),
        unit_price: Decimal::new(p, 2),
    })
}

fn arb_status() -> impl Strategy<Value = PurchaseOrderStatus> {
    prop_oneof![
        Just(PurchaseOrderStatus::Draft),
        Just(PurchaseOrderStatus::Ordered),
        Just(PurchaseOrderStatus::Received),
        Just(PurchaseOrderStatus::Cancelled),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Order total is the sum of quantity × unit price over all lines.
    #[test]
    fn prop_total_is_sum_of_lines(lines in prop::collection::vec(arb_line(), 1..20)) {
        let priced = PurchaseOrderService::price_lines(&lines).unwrap();
        let expected: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        prop_assert_eq!(priced.total_amount, expected);
        prop_assert_eq!(priced.lines.len(), lines.len());
    }

    /// Receiving twice never succeeds: after the first receipt the order is RECEIVED.
    #[test]
    fn prop_receive_guard(status in arb_status()) {
        let id = PurchaseOrderId::new();
        let first = PurchaseOrderService::ensure_receivable(id, status);
        match status {
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered => {
                prop_assert!(first.is_ok());
                let second = PurchaseOrderService::ensure_receivable(id, PurchaseOrderStatus::Received);
                prop_assert!(matches!(second, Err(PurchasingError::AlreadyReceived(_))));
            }
            _ => prop_assert!(first.is_err()),
        }
    }

    /// No manual transition ever reaches RECEIVED.
    #[test]
    fn prop_manual_transition_never_receives(from in arb_status()) {
        prop_assert!(PurchaseOrderService::transition(from, PurchaseOrderStatus::Received).is_err());
    }
}
