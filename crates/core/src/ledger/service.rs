//! Quantity rules for stock movements.
//!
//! `StockLedger` is stateless: it takes the current quantity (or `None` when
//! no stock row exists) and a request, and returns the outcome the caller must
//! persist. Callers hold a row lock on the stock row while doing so.

use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{AppliedMovement, MovementRequest, MovementType};
use crate::precision;

/// Stateless service for applying stock movements.
pub struct StockLedger;

impl StockLedger {
    /// Validates a request before any row is touched.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if a non-adjustment movement carries a zero or
    ///   negative quantity
    /// - `InvalidPrecision` if the quantity or unit cost would be rounded
    ///   when stored
    pub fn validate(request: &MovementRequest) -> Result<(), LedgerError> {
        if request.movement_type != MovementType::Adjustment && request.quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity {
                movement_type: request.movement_type,
                quantity: request.quantity,
            });
        }
        if !precision::fits(request.quantity) {
            return Err(LedgerError::InvalidPrecision {
                field: "quantity",
                value: request.quantity,
            });
        }
        if let Some(unit_cost) = request.unit_cost.filter(|cost| !precision::fits(*cost)) {
            return Err(LedgerError::InvalidPrecision {
                field: "unit_cost",
                value: unit_cost,
            });
        }
        Ok(())
    }

    /// Applies a movement to the current quantity.
    ///
    /// A missing row counts as zero for inbound movements and for
    /// non-negative adjustments; anything that would reduce a missing row
    /// fails with `StockNotFound`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if the request fails validation
    /// - `StockNotFound` if an outbound movement targets a missing row
    /// - `InsufficientStock` if the result would be negative
    pub fn apply(
        current: Option<Decimal>,
        request: &MovementRequest,
    ) -> Result<AppliedMovement, LedgerError> {
        Self::validate(request)?;

        let delta = request.signed_delta();

        let previous_quantity = match current {
            Some(quantity) => quantity,
            None if delta >= Decimal::ZERO => Decimal::ZERO,
            None => {
                return Err(LedgerError::StockNotFound {
                    product_id: request.key.product_id,
                    warehouse_id: request.key.warehouse_id,
                });
            }
        };

        let new_quantity = previous_quantity + delta;
        if new_quantity < Decimal::ZERO {
            return Err(LedgerError::InsufficientStock {
                available: previous_quantity,
                requested: delta.abs(),
            });
        }

        Ok(AppliedMovement {
            previous_quantity,
            new_quantity,
            delta,
            creates_stock: current.is_none(),
        })
    }

    /// Signed delta that brings `on_hand` to `target`.
    #[must_use]
    pub fn delta_to(on_hand: Option<Decimal>, target: Decimal) -> Decimal {
        target - on_hand.unwrap_or(Decimal::ZERO)
    }
}
