//! Property-based tests for FulfillmentService.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::fulfillment::service::FulfillmentService;
use crate::fulfillment::types::{SalesOrderLineInput, SalesOrderStatus, ShipmentStatus};
use depot_shared::types::ProductId;

fn arb_amount(max: i64) -> impl Strategy<Value = Decimal> {
    (0i64..max).prop_map(|n| Decimal::new(n, 2))
}

fn arb_line() -> impl Strategy<Value = SalesOrderLineInput> {
    (
        (1i64..10_000i64).prop_map(|n| Decimal::new(n, 3)),
        arb_amount(1_000_000),
        arb_amount(10_000),
        arb_amount(10_000),
    )
        .prop_map(|(quantity, unit_price, tax_amount, discount_amount)| SalesOrderLineInput {
            product_id: ProductId::new(),
            quantity,
            unit_price,
            tax_amount,
            discount_amount,
        })
}

fn arb_order_status() -> impl Strategy<Value = SalesOrderStatus> {
    prop_oneof![
        Just(SalesOrderStatus::Draft),
        Just(SalesOrderStatus::Confirmed),
        Just(SalesOrderStatus::Shipped),
        Just(SalesOrderStatus::Delivered),
        Just(SalesOrderStatus::Cancelled),
        Just(SalesOrderStatus::Returned),
    ]
}

fn arb_shipment_status() -> impl Strategy<Value = ShipmentStatus> {
    prop_oneof![
        Just(ShipmentStatus::Pending),
        Just(ShipmentStatus::Shipped),
        Just(ShipmentStatus::Delivered),
        Just(ShipmentStatus::Cancelled),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Order total equals subtotal + tax − discount and the sum of line totals.
    #[test]
    fn prop_totals_add_up(lines in prop::collection::vec(arb_line(), 1..20)) {
        let (priced, totals) = FulfillmentService::price_order(&lines).unwrap();

        let line_sum: Decimal = priced.iter().map(|l| l.total).sum();
        prop_assert_eq!(totals.total_amount, line_sum);
        prop_assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount - totals.discount_amount
        );
    }

    /// Manual status changes never produce SHIPPED or DELIVERED.
    #[test]
    fn prop_manual_never_ships(from in arb_order_status(), to in arb_order_status()) {
        if let Ok(status) = FulfillmentService::transition_order(from, to) {
            prop_assert!(status != SalesOrderStatus::Shipped);
            prop_assert!(status != SalesOrderStatus::Delivered);
        }
    }

    /// Terminal orders accept no manual change.
    #[test]
    fn prop_terminal_orders_frozen(to in arb_order_status()) {
        prop_assert!(FulfillmentService::transition_order(SalesOrderStatus::Cancelled, to).is_err());
        prop_assert!(FulfillmentService::transition_order(SalesOrderStatus::Returned, to).is_err());
    }

    /// A delivered shipment always delivers its order, and only from SHIPPED.
    #[test]
    fn prop_delivery_cascades(
        from in arb_shipment_status(),
        to in arb_shipment_status(),
        order in arb_order_status(),
    ) {
        if let Ok(transition) = FulfillmentService::transition_shipment(from, to, order) {
            if transition.new_status == ShipmentStatus::Delivered {
                prop_assert_eq!(order, SalesOrderStatus::Shipped);
                prop_assert_eq!(transition.order_status, Some(SalesOrderStatus::Delivered));
            }
            prop_assert_eq!(transition.restocks, transition.new_status == ShipmentStatus::Cancelled);
        }
    }
}
