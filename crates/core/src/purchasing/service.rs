//! Purchase order rules.

use depot_shared::types::{PurchaseOrderId, WarehouseId};
use rust_decimal::Decimal;

use crate::ledger::{MovementReference, MovementRequest, MovementType, StockKey};
use crate::precision;
use crate::purchasing::error::PurchasingError;
use crate::purchasing::types::{
    PricedPurchaseLine, PricedPurchaseOrder, PurchaseOrderLineInput, PurchaseOrderStatus,
};

/// Stateless service for purchase order rules.
pub struct PurchaseOrderService;

impl PurchaseOrderService {
    /// Validates lines and computes `total = quantity × unit_price` per line
    /// and the order total.
    ///
    /// # Errors
    ///
    /// - `EmptyOrder` if there are no lines
    /// - `InvalidLine` if a quantity is not positive, a price is negative, or
    ///   a value has more than 4 decimal places
    pub fn price_lines(
        lines: &[PurchaseOrderLineInput],
    ) -> Result<PricedPurchaseOrder, PurchasingError> {
        if lines.is_empty() {
            return Err(PurchasingError::EmptyOrder);
        }

        let mut priced = Vec::with_capacity(lines.len());
        let mut total_amount = Decimal::ZERO;

        for (index, line) in lines.iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(PurchasingError::InvalidLine {
                    index,
                    reason: "quantity must be positive".to_string(),
                });
            }
            if line.unit_price < Decimal::ZERO {
                return Err(PurchasingError::InvalidLine {
                    index,
                    reason: "unit price cannot be negative".to_string(),
                });
            }

            if !precision::fits(line.quantity) || !precision::fits(line.unit_price) {
                return Err(PurchasingError::InvalidLine {
                    index,
                    reason: "quantity and unit price allow at most 4 decimal places".to_string(),
                });
            }

            let total = precision::round(line.quantity * line.unit_price);
            if !precision::fits(total) {
                return Err(PurchasingError::InvalidLine {
                    index,
                    reason: "line total is too large".to_string(),
                });
            }
            total_amount += total;
            priced.push(PricedPurchaseLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total,
            });
        }

        Ok(PricedPurchaseOrder {
            lines: priced,
            total_amount,
        })
    }

    /// Checks that fields and items may be edited.
    ///
    /// # Errors
    ///
    /// Returns `NotDraft` unless the order is DRAFT.
    pub fn ensure_editable(status: PurchaseOrderStatus) -> Result<(), PurchasingError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(PurchasingError::NotDraft(status))
        }
    }

    /// Validates a manual status change.
    ///
    /// RECEIVED is only reachable through [`Self::ensure_receivable`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for anything outside the transition table.
    pub fn transition(
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> Result<PurchaseOrderStatus, PurchasingError> {
        use PurchaseOrderStatus::{Cancelled, Draft, Ordered};

        match (from, to) {
            (Draft, Draft | Ordered | Cancelled) | (Ordered, Cancelled) => Ok(to),
            _ => Err(PurchasingError::InvalidTransition { from, to }),
        }
    }

    /// Checks that the order can be received.
    ///
    /// # Errors
    ///
    /// - `AlreadyReceived` if the order is RECEIVED
    /// - `NotReceivable` if the order is CANCELLED
    pub fn ensure_receivable(
        id: PurchaseOrderId,
        status: PurchaseOrderStatus,
    ) -> Result<(), PurchasingError> {
        match status {
            PurchaseOrderStatus::Received => Err(PurchasingError::AlreadyReceived(id)),
            PurchaseOrderStatus::Cancelled => Err(PurchasingError::NotReceivable(status)),
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Ordered => Ok(()),
        }
    }

    /// Builds one IN movement per line for receiving into `warehouse_id`.
    #[must_use]
    pub fn receipt_movements(
        id: PurchaseOrderId,
        order_number: &str,
        warehouse_id: WarehouseId,
        lines: &[PricedPurchaseLine],
    ) -> Vec<MovementRequest> {
        lines
            .iter()
            .map(|line| {
                MovementRequest::new(
                    StockKey::new(line.product_id, warehouse_id),
                    MovementType::In,
                    line.quantity,
                    MovementReference::PurchaseOrder(id),
                )
                .with_unit_cost(line.unit_price)
                .with_note(format!("Received from PO #{order_number}"))
            })
            .collect()
    }
}
