//! Stock adjustment rules.

use std::collections::HashSet;

use chrono::Utc;
use depot_shared::types::{StockAdjustmentId, UserId, WarehouseId};
use rust_decimal::Decimal;

use crate::adjustment::error::AdjustmentError;
use crate::adjustment::types::{
    AdjustmentApproval, AdjustmentItemInput, AdjustmentStatus, CountedItem,
};
use crate::ledger::{MovementReference, MovementRequest, MovementType, StockKey, StockLedger};
use crate::precision;

/// Stateless service for stock adjustment rules.
pub struct AdjustmentService;

impl AdjustmentService {
    /// Validates the header reason and the counted lines.
    ///
    /// # Errors
    ///
    /// - `ReasonRequired` if the reason is blank
    /// - `EmptyItems` if there are no lines
    /// - `DuplicateProduct` if a product is counted twice
    /// - `NegativeCount` if a count is below zero
    /// - `InvalidPrecision` if a count has more than 4 decimal places
    pub fn validate(reason: &str, items: &[AdjustmentItemInput]) -> Result<(), AdjustmentError> {
        if reason.trim().is_empty() {
            return Err(AdjustmentError::ReasonRequired);
        }
        Self::validate_items(items)
    }

    /// Validates counted lines.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn validate_items(items: &[AdjustmentItemInput]) -> Result<(), AdjustmentError> {
        if items.is_empty() {
            return Err(AdjustmentError::EmptyItems);
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.product_id) {
                return Err(AdjustmentError::DuplicateProduct(item.product_id));
            }
            if item.actual_quantity < Decimal::ZERO {
                return Err(AdjustmentError::NegativeCount {
                    product_id: item.product_id,
                    actual: item.actual_quantity,
                });
            }
            if !precision::fits(item.actual_quantity) {
                return Err(AdjustmentError::InvalidPrecision {
                    product_id: item.product_id,
                    actual: item.actual_quantity,
                });
            }
        }
        Ok(())
    }

    /// Pairs a counted line with the on-hand snapshot.
    #[must_use]
    pub fn count(item: &AdjustmentItemInput, system_quantity: Option<Decimal>) -> CountedItem {
        let system_quantity = system_quantity.unwrap_or(Decimal::ZERO);
        CountedItem {
            product_id: item.product_id,
            system_quantity,
            actual_quantity: item.actual_quantity,
            difference: item.actual_quantity - system_quantity,
            note: item.note.clone(),
        }
    }

    /// Checks that the adjustment is still DRAFT.
    ///
    /// # Errors
    ///
    /// Returns `NotDraft` otherwise.
    pub fn ensure_draft(status: AdjustmentStatus) -> Result<(), AdjustmentError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(AdjustmentError::NotDraft(status))
        }
    }

    /// Approves a DRAFT adjustment.
    ///
    /// # Errors
    ///
    /// Returns `NotDraft` unless the adjustment is DRAFT.
    pub fn approve(
        status: AdjustmentStatus,
        approved_by: UserId,
    ) -> Result<AdjustmentApproval, AdjustmentError> {
        Self::ensure_draft(status)?;
        Ok(AdjustmentApproval {
            new_status: AdjustmentStatus::Approved,
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Builds the ADJUSTMENT movement that brings the stock row to the
    /// counted quantity.
    ///
    /// The delta is taken against `on_hand`, the locked quantity at approval
    /// time, so the row lands on `actual_quantity` even if it moved after the
    /// count was entered.
    #[must_use]
    pub fn approval_movement(
        id: StockAdjustmentId,
        adjustment_number: &str,
        warehouse_id: WarehouseId,
        item: &CountedItem,
        on_hand: Option<Decimal>,
    ) -> MovementRequest {
        let delta = StockLedger::delta_to(on_hand, item.actual_quantity);
        let note = match item.note.as_deref() {
            Some(note) if !note.trim().is_empty() => {
                format!("Stock Adjustment {adjustment_number}: {note}")
            }
            _ => format!("Stock Adjustment {adjustment_number}"),
        };

        MovementRequest::new(
            StockKey::new(item.product_id, warehouse_id),
            MovementType::Adjustment,
            delta,
            MovementReference::Adjustment(id),
        )
        .with_note(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_shared::types::ProductId;
    use rust_decimal_macros::dec;

    fn input(actual: Decimal) -> AdjustmentItemInput {
        AdjustmentItemInput {
            product_id: ProductId::new(),
            actual_quantity: actual,
            note: None,
        }
    }

    #[test]
    fn test_count_computes_difference() {
        let counted = AdjustmentService::count(&input(dec!(42)), Some(dec!(50)));
        assert_eq!(counted.system_quantity, dec!(50));
        assert_eq!(counted.difference, dec!(-8));

        let counted = AdjustmentService::count(&input(dec!(3)), None);
        assert_eq!(counted.system_quantity, dec!(0));
        assert_eq!(counted.difference, dec!(3));
    }

    #[test]
    fn test_validate() {
        assert!(AdjustmentService::validate("cycle count", &[input(dec!(1))]).is_ok());
        assert!(matches!(
            AdjustmentService::validate("   ", &[input(dec!(1))]),
            Err(AdjustmentError::ReasonRequired)
        ));
        assert!(matches!(
            AdjustmentService::validate("count", &[]),
            Err(AdjustmentError::EmptyItems)
        ));
        assert!(matches!(
            AdjustmentService::validate("count", &[input(dec!(-1))]),
            Err(AdjustmentError::NegativeCount { .. })
        ));
        assert!(matches!(
            AdjustmentService::validate("count", &[input(dec!(1.00005))]),
            Err(AdjustmentError::InvalidPrecision { .. })
        ));
        assert!(AdjustmentService::validate("count", &[input(dec!(1.2500))]).is_ok());
    }

    #[test]
    fn test_duplicate_products_rejected() {
        let item = input(dec!(1));
        let result = AdjustmentService::validate_items(&[item.clone(), item.clone()]);
        assert!(matches!(result, Err(AdjustmentError::DuplicateProduct(p)) if p == item.product_id));
    }

    #[test]
    fn test_approve_only_from_draft() {
        let approver = UserId::new();
        let approval = AdjustmentService::approve(AdjustmentStatus::Draft, approver).unwrap();
        assert_eq!(approval.new_status, AdjustmentStatus::Approved);
        assert_eq!(approval.approved_by, approver);

        for status in [AdjustmentStatus::Approved, AdjustmentStatus::Cancelled] {
            assert!(matches!(
                AdjustmentService::approve(status, approver),
                Err(AdjustmentError::NotDraft(s)) if s == status
            ));
        }
    }

    #[test]
    fn test_approval_movement_uses_snapshot_difference() {
        let id = StockAdjustmentId::new();
        let warehouse_id = WarehouseId::new();
        let counted = AdjustmentService::count(
            &AdjustmentItemInput {
                product_id: ProductId::new(),
                actual_quantity: dec!(12),
                note: Some("damaged".to_string()),
            },
            Some(dec!(15)),
        );

        let movement =
            AdjustmentService::approval_movement(id, "ADJ-2026-000001", warehouse_id, &counted, Some(dec!(15)));

        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert_eq!(movement.quantity, dec!(-3));
        assert_eq!(movement.quantity, counted.difference);
        assert_eq!(movement.reference, MovementReference::Adjustment(id));
        assert_eq!(movement.note.as_deref(), Some("Stock Adjustment ADJ-2026-000001: damaged"));
    }

    #[test]
    fn test_approval_movement_after_stock_moved() {
        let counted = AdjustmentService::count(&input(dec!(12)), Some(dec!(15)));
        // Five more arrived between count and approval.
        let movement = AdjustmentService::approval_movement(
            StockAdjustmentId::new(),
            "ADJ-2026-000002",
            WarehouseId::new(),
            &counted,
            Some(dec!(20)),
        );
        assert_eq!(movement.quantity, dec!(-8));
        assert_eq!(movement.note.as_deref(), Some("Stock Adjustment ADJ-2026-000002"));
    }
}
