//! Ledger error types.

use depot_shared::AppError;
use depot_shared::types::{ProductId, WarehouseId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::types::MovementType;

/// Errors that can occur while applying stock movements.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// IN/OUT/TRANSFER movements need a positive quantity.
    #[error("{movement_type} movement quantity must be positive, got {quantity}")]
    InvalidQuantity {
        /// The movement type.
        movement_type: MovementType,
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// A quantity or unit cost has more precision than the ledger stores.
    #[error("{field} {value} exceeds 4 decimal places or 15 integer digits")]
    InvalidPrecision {
        /// Which value was rejected.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// Outbound movement against a product/warehouse with no stock row.
    #[error("No stock for product {product_id} in warehouse {warehouse_id}")]
    StockNotFound {
        /// Product requested.
        product_id: ProductId,
        /// Warehouse requested.
        warehouse_id: WarehouseId,
    },

    /// Outbound movement would drive the quantity negative.
    #[error("Insufficient stock. Available: {available}, Required: {requested}")]
    InsufficientStock {
        /// Quantity on hand.
        available: Decimal,
        /// Quantity requested.
        requested: Decimal,
    },

    /// Product does not exist in the organization.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// Warehouse does not exist in the organization.
    #[error("Warehouse {0} not found")]
    WarehouseNotFound(WarehouseId),

    /// Warehouse is inactive.
    #[error("Warehouse {0} is inactive")]
    WarehouseInactive(WarehouseId),

    /// The stock row changed between the locking read and the update.
    #[error("Stock for product {product_id} in warehouse {warehouse_id} was modified concurrently")]
    ConcurrentModification {
        /// Product affected.
        product_id: ProductId,
        /// Warehouse affected.
        warehouse_id: WarehouseId,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidPrecision { .. } => "INVALID_PRECISION",
            Self::StockNotFound { .. } => "STOCK_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::WarehouseNotFound(_) => "WAREHOUSE_NOT_FOUND",
            Self::WarehouseInactive(_) => "WAREHOUSE_INACTIVE",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidQuantity { .. } | LedgerError::InvalidPrecision { .. } => {
                Self::Validation(err.to_string())
            }
            LedgerError::StockNotFound { .. }
            | LedgerError::ProductNotFound(_)
            | LedgerError::WarehouseNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available: available.to_string(),
                requested: requested.to_string(),
            },
            LedgerError::WarehouseInactive(_) => Self::InvalidState(err.to_string()),
            LedgerError::ConcurrentModification { .. } => Self::Conflict(err.to_string()),
            LedgerError::Database(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_stock_message() {
        let err = LedgerError::InsufficientStock {
            available: dec!(10),
            requested: dec!(12),
        };
        assert_eq!(err.to_string(), "Insufficient stock. Available: 10, Required: 12");
        assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_insufficient_stock_keeps_quantities() {
        let app: AppError = LedgerError::InsufficientStock {
            available: dec!(3.5),
            requested: dec!(4),
        }
        .into();
        match app {
            AppError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, "3.5");
                assert_eq!(requested, "4");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_kind_mapping() {
        let product_id = ProductId::new();
        let warehouse_id = WarehouseId::new();
        assert!(matches!(
            AppError::from(LedgerError::StockNotFound { product_id, warehouse_id }),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::InvalidQuantity {
                movement_type: MovementType::In,
                quantity: dec!(0)
            }),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::InvalidPrecision {
                field: "quantity",
                value: dec!(0.00001)
            }),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::ConcurrentModification { product_id, warehouse_id }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::WarehouseInactive(warehouse_id)),
            AppError::InvalidState(_)
        ));
    }
}
