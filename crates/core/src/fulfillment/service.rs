//! Sales order and shipment rules.

use depot_shared::types::{ProductId, ShipmentId, WarehouseId};
use rust_decimal::Decimal;

use crate::fulfillment::error::FulfillmentError;
use crate::fulfillment::types::{
    PricedSalesLine, SalesOrderLineInput, SalesOrderStatus, SalesOrderTotals, ShipmentStatus,
};
use crate::ledger::{MovementReference, MovementRequest, MovementType, StockKey};
use crate::precision;

/// Effects of a shipment status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipmentTransition {
    /// Shipment status after the change.
    pub new_status: ShipmentStatus,
    /// Stamp `shipped_date`.
    pub sets_shipped_date: bool,
    /// Stamp `delivered_date`.
    pub sets_delivered_date: bool,
    /// New status for the linked sales order, if it changes.
    pub order_status: Option<SalesOrderStatus>,
    /// Put the shipped quantities back into stock.
    pub restocks: bool,
}

impl ShipmentTransition {
    const fn to(new_status: ShipmentStatus) -> Self {
        Self {
            new_status,
            sets_shipped_date: false,
            sets_delivered_date: false,
            order_status: None,
            restocks: false,
        }
    }
}

/// Stateless service for fulfillment rules.
pub struct FulfillmentService;

impl FulfillmentService {
    /// Validates lines and computes line totals and order totals.
    ///
    /// Line total is `quantity × unit_price + tax − discount`.
    ///
    /// # Errors
    ///
    /// - `EmptyOrder` if there are no lines
    /// - `InvalidLine` for a non-positive quantity, any negative amount, or a
    ///   value with more than 4 decimal places
    pub fn price_order(
        lines: &[SalesOrderLineInput],
    ) -> Result<(Vec<PricedSalesLine>, SalesOrderTotals), FulfillmentError> {
        if lines.is_empty() {
            return Err(FulfillmentError::EmptyOrder);
        }

        let mut priced = Vec::with_capacity(lines.len());
        let mut totals = SalesOrderTotals::default();

        for (index, line) in lines.iter().enumerate() {
            let reason = if line.quantity <= Decimal::ZERO {
                Some("quantity must be positive")
            } else if line.unit_price < Decimal::ZERO {
                Some("unit price cannot be negative")
            } else if line.tax_amount < Decimal::ZERO {
                Some("tax amount cannot be negative")
            } else if line.discount_amount < Decimal::ZERO {
                Some("discount amount cannot be negative")
            } else if ![line.quantity, line.unit_price, line.tax_amount, line.discount_amount]
                .into_iter()
                .all(precision::fits)
            {
                Some("quantities and amounts allow at most 4 decimal places")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(FulfillmentError::InvalidLine {
                    index,
                    reason: reason.to_string(),
                });
            }

            let gross = precision::round(line.quantity * line.unit_price);
            let total = gross + line.tax_amount - line.discount_amount;

            totals.subtotal += gross;
            totals.tax_amount += line.tax_amount;
            totals.discount_amount += line.discount_amount;
            totals.total_amount += total;

            priced.push(PricedSalesLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_amount: line.tax_amount,
                discount_amount: line.discount_amount,
                total,
            });
        }

        Ok((priced, totals))
    }

    /// Validates a manual sales order status change.
    ///
    /// SHIPPED and DELIVERED are set by shipments, never by hand.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrderTransition` outside the table:
    /// - DRAFT → CONFIRMED
    /// - DRAFT | CONFIRMED | SHIPPED → CANCELLED
    /// - SHIPPED | DELIVERED → RETURNED
    pub fn transition_order(
        from: SalesOrderStatus,
        to: SalesOrderStatus,
    ) -> Result<SalesOrderStatus, FulfillmentError> {
        use SalesOrderStatus::{Cancelled, Confirmed, Delivered, Draft, Returned, Shipped};

        match (from, to) {
            (Draft, Confirmed)
            | (Draft | Confirmed | Shipped, Cancelled)
            | (Shipped | Delivered, Returned) => Ok(to),
            _ => Err(FulfillmentError::InvalidOrderTransition { from, to }),
        }
    }

    /// Checks that a shipment may be created for the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotShippable` unless the order is CONFIRMED.
    pub fn ensure_shippable(status: SalesOrderStatus) -> Result<(), FulfillmentError> {
        if status == SalesOrderStatus::Confirmed {
            Ok(())
        } else {
            Err(FulfillmentError::OrderNotShippable(status))
        }
    }

    /// Validates a shipment status change and returns what it implies.
    ///
    /// # Errors
    ///
    /// - `InvalidShipmentTransition` outside PENDING → SHIPPED → DELIVERED
    ///   and PENDING | SHIPPED → CANCELLED
    /// - `OrderNotShipped` when delivering a shipment whose order is not SHIPPED
    pub fn transition_shipment(
        from: ShipmentStatus,
        to: ShipmentStatus,
        order_status: SalesOrderStatus,
    ) -> Result<ShipmentTransition, FulfillmentError> {
        use ShipmentStatus::{Cancelled, Delivered, Pending, Shipped};

        match (from, to) {
            (Pending, Shipped) => Ok(ShipmentTransition {
                sets_shipped_date: true,
                ..ShipmentTransition::to(Shipped)
            }),
            (Shipped, Delivered) => {
                if order_status != SalesOrderStatus::Shipped {
                    return Err(FulfillmentError::OrderNotShipped(order_status));
                }
                Ok(ShipmentTransition {
                    sets_delivered_date: true,
                    order_status: Some(SalesOrderStatus::Delivered),
                    ..ShipmentTransition::to(Delivered)
                })
            }
            (Pending | Shipped, Cancelled) => Ok(ShipmentTransition {
                restocks: true,
                order_status: (order_status == SalesOrderStatus::Shipped)
                    .then_some(SalesOrderStatus::Confirmed),
                ..ShipmentTransition::to(Cancelled)
            }),
            _ => Err(FulfillmentError::InvalidShipmentTransition { from, to }),
        }
    }

    /// Builds one OUT movement per line for a new shipment.
    #[must_use]
    pub fn shipment_movements(
        id: ShipmentId,
        shipment_number: &str,
        warehouse_id: WarehouseId,
        lines: &[(ProductId, Decimal)],
    ) -> Vec<MovementRequest> {
        Self::movements(id, warehouse_id, lines, MovementType::Out, &format!("Shipped via {shipment_number}"))
    }

    /// Builds one IN movement per line returning a cancelled shipment to stock.
    #[must_use]
    pub fn restock_movements(
        id: ShipmentId,
        shipment_number: &str,
        warehouse_id: WarehouseId,
        lines: &[(ProductId, Decimal)],
    ) -> Vec<MovementRequest> {
        Self::movements(
            id,
            warehouse_id,
            lines,
            MovementType::In,
            &format!("Shipment {shipment_number} cancelled"),
        )
    }

    fn movements(
        id: ShipmentId,
        warehouse_id: WarehouseId,
        lines: &[(ProductId, Decimal)],
        movement_type: MovementType,
        note: &str,
    ) -> Vec<MovementRequest> {
        lines
            .iter()
            .map(|(product_id, quantity)| {
                MovementRequest::new(
                    StockKey::new(*product_id, warehouse_id),
                    movement_type,
                    *quantity,
                    MovementReference::Shipment(id),
                )
                .with_note(note)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal, tax: Decimal, discount: Decimal) -> SalesOrderLineInput {
        SalesOrderLineInput {
            product_id: ProductId::new(),
            quantity,
            unit_price,
            tax_amount: tax,
            discount_amount: discount,
        }
    }

    #[test]
    fn test_price_order() {
        let (lines, totals) = FulfillmentService::price_order(&[
            line(dec!(2), dec!(10), dec!(2), dec!(1)),
            line(dec!(1), dec!(5.50), dec!(0), dec!(0.50)),
        ])
        .unwrap();

        assert_eq!(lines[0].total, dec!(21));
        assert_eq!(lines[1].total, dec!(5.00));
        assert_eq!(totals.subtotal, dec!(25.50));
        assert_eq!(totals.tax_amount, dec!(2));
        assert_eq!(totals.discount_amount, dec!(1.50));
        assert_eq!(totals.total_amount, dec!(26.00));
    }

    #[test]
    fn test_price_order_validation() {
        assert!(matches!(
            FulfillmentService::price_order(&[]),
            Err(FulfillmentError::EmptyOrder)
        ));
        assert!(matches!(
            FulfillmentService::price_order(&[line(dec!(0), dec!(1), dec!(0), dec!(0))]),
            Err(FulfillmentError::InvalidLine { index: 0, .. })
        ));
        assert!(matches!(
            FulfillmentService::price_order(&[
                line(dec!(1), dec!(1), dec!(0), dec!(0)),
                line(dec!(1), dec!(1), dec!(0), dec!(-1)),
            ]),
            Err(FulfillmentError::InvalidLine { index: 1, .. })
        ));
        assert!(matches!(
            FulfillmentService::price_order(&[line(dec!(1), dec!(1), dec!(0.00001), dec!(0))]),
            Err(FulfillmentError::InvalidLine { index: 0, .. })
        ));
    }

    #[test]
    fn test_gross_rounded_to_stored_scale() {
        let (lines, totals) =
            FulfillmentService::price_order(&[line(dec!(1.5), dec!(1.0001), dec!(0), dec!(0))]).unwrap();
        assert_eq!(totals.subtotal, dec!(1.5002));
        assert_eq!(lines[0].total, dec!(1.5002));
    }

    #[test]
    fn test_happy_path_order_lifecycle() {
        use SalesOrderStatus::{Confirmed, Draft, Shipped};

        let status = FulfillmentService::transition_order(Draft, Confirmed).unwrap();
        assert!(FulfillmentService::ensure_shippable(status).is_ok());

        let shipped = FulfillmentService::transition_shipment(ShipmentStatus::Pending, ShipmentStatus::Shipped, Shipped)
            .unwrap();
        assert!(shipped.sets_shipped_date);
        assert_eq!(shipped.order_status, None);

        let delivered =
            FulfillmentService::transition_shipment(ShipmentStatus::Shipped, ShipmentStatus::Delivered, Shipped)
                .unwrap();
        assert!(delivered.sets_delivered_date);
        assert_eq!(delivered.order_status, Some(SalesOrderStatus::Delivered));
    }

    #[test]
    fn test_manual_status_cannot_ship_or_deliver() {
        use SalesOrderStatus::{Confirmed, Delivered, Draft, Shipped};
        assert!(FulfillmentService::transition_order(Confirmed, Shipped).is_err());
        assert!(FulfillmentService::transition_order(Shipped, Delivered).is_err());
        assert!(FulfillmentService::transition_order(Draft, Delivered).is_err());
    }

    #[test]
    fn test_cancel_and_return() {
        use SalesOrderStatus::{Cancelled, Confirmed, Delivered, Draft, Returned, Shipped};
        for from in [Draft, Confirmed, Shipped] {
            assert!(FulfillmentService::transition_order(from, Cancelled).is_ok());
        }
        assert!(FulfillmentService::transition_order(Delivered, Cancelled).is_err());
        assert!(FulfillmentService::transition_order(Delivered, Returned).is_ok());
        assert!(FulfillmentService::transition_order(Draft, Returned).is_err());
        assert!(FulfillmentService::transition_order(Cancelled, Confirmed).is_err());
        assert!(FulfillmentService::transition_order(Returned, Cancelled).is_err());
    }

    #[test]
    fn test_only_confirmed_orders_ship() {
        use SalesOrderStatus::{Cancelled, Confirmed, Delivered, Draft, Returned, Shipped};
        assert!(FulfillmentService::ensure_shippable(Confirmed).is_ok());
        for status in [Draft, Shipped, Delivered, Cancelled, Returned] {
            assert!(matches!(
                FulfillmentService::ensure_shippable(status),
                Err(FulfillmentError::OrderNotShippable(s)) if s == status
            ));
        }
    }

    #[test]
    fn test_deliver_requires_shipped_order() {
        let result = FulfillmentService::transition_shipment(
            ShipmentStatus::Shipped,
            ShipmentStatus::Delivered,
            SalesOrderStatus::Confirmed,
        );
        assert!(matches!(
            result,
            Err(FulfillmentError::OrderNotShipped(SalesOrderStatus::Confirmed))
        ));
    }

    #[test]
    fn test_pending_cannot_jump_to_delivered() {
        let result = FulfillmentService::transition_shipment(
            ShipmentStatus::Pending,
            ShipmentStatus::Delivered,
            SalesOrderStatus::Shipped,
        );
        assert!(matches!(result, Err(FulfillmentError::InvalidShipmentTransition { .. })));
    }

    #[test]
    fn test_cancel_shipment_restocks_and_reopens_order() {
        let transition = FulfillmentService::transition_shipment(
            ShipmentStatus::Pending,
            ShipmentStatus::Cancelled,
            SalesOrderStatus::Shipped,
        )
        .unwrap();
        assert!(transition.restocks);
        assert_eq!(transition.order_status, Some(SalesOrderStatus::Confirmed));

        let transition = FulfillmentService::transition_shipment(
            ShipmentStatus::Shipped,
            ShipmentStatus::Cancelled,
            SalesOrderStatus::Cancelled,
        )
        .unwrap();
        assert!(transition.restocks);
        assert_eq!(transition.order_status, None);
    }

    #[test]
    fn test_finished_shipments_are_frozen() {
        for from in [ShipmentStatus::Delivered, ShipmentStatus::Cancelled] {
            for to in [
                ShipmentStatus::Pending,
                ShipmentStatus::Shipped,
                ShipmentStatus::Delivered,
                ShipmentStatus::Cancelled,
            ] {
                assert!(
                    FulfillmentService::transition_shipment(from, to, SalesOrderStatus::Shipped).is_err()
                );
            }
        }
    }

    #[test]
    fn test_shipment_movements() {
        let id = ShipmentId::new();
        let warehouse_id = WarehouseId::new();
        let product_id = ProductId::new();
        let lines = [(product_id, dec!(3))];

        let out = FulfillmentService::shipment_movements(id, "SH-2026-000001", warehouse_id, &lines);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].movement_type, MovementType::Out);
        assert_eq!(out[0].quantity, dec!(3));
        assert_eq!(out[0].reference, MovementReference::Shipment(id));
        assert_eq!(out[0].note.as_deref(), Some("Shipped via SH-2026-000001"));

        let back = FulfillmentService::restock_movements(id, "SH-2026-000001", warehouse_id, &lines);
        assert_eq!(back[0].movement_type, MovementType::In);
        assert_eq!(back[0].key, out[0].key);
        assert_eq!(back[0].note.as_deref(), Some("Shipment SH-2026-000001 cancelled"));
    }
}
