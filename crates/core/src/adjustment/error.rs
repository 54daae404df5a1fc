//! Stock adjustment error types.

use depot_shared::AppError;
use depot_shared::types::{ProductId, StockAdjustmentId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::adjustment::types::AdjustmentStatus;
use crate::ledger::LedgerError;

/// Errors that can occur during stock adjustment operations.
#[derive(Debug, Error)]
pub enum AdjustmentError {
    /// Adjustment not found in the organization.
    #[error("Stock adjustment {0} not found")]
    NotFound(StockAdjustmentId),

    /// Operation requires a DRAFT adjustment.
    #[error("Stock adjustment is {0}, only DRAFT adjustments can be changed")]
    NotDraft(AdjustmentStatus),

    /// Adjustment has no items.
    #[error("Stock adjustment must have at least one item")]
    EmptyItems,

    /// The same product appears twice.
    #[error("Product {0} is listed more than once")]
    DuplicateProduct(ProductId),

    /// Counted quantity is negative.
    #[error("Counted quantity for product {product_id} cannot be negative: {actual}")]
    NegativeCount {
        /// Product counted.
        product_id: ProductId,
        /// Rejected count.
        actual: Decimal,
    },

    /// Count has more precision than stock quantities store.
    #[error("Count {actual} for product {product_id} exceeds 4 decimal places or 15 integer digits")]
    InvalidPrecision {
        /// Product counted.
        product_id: ProductId,
        /// Rejected count.
        actual: Decimal,
    },

    /// Reason is blank.
    #[error("Adjustment reason is required")]
    ReasonRequired,

    /// Stock movement failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AdjustmentError {
    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ADJUSTMENT_NOT_FOUND",
            Self::NotDraft(_) => "NOT_DRAFT",
            Self::EmptyItems => "EMPTY_ITEMS",
            Self::DuplicateProduct(_) => "DUPLICATE_PRODUCT",
            Self::NegativeCount { .. } => "NEGATIVE_COUNT",
            Self::InvalidPrecision { .. } => "INVALID_PRECISION",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<AdjustmentError> for AppError {
    fn from(err: AdjustmentError) -> Self {
        match err {
            AdjustmentError::NotFound(_) => Self::NotFound(err.to_string()),
            AdjustmentError::NotDraft(_) => Self::InvalidState(err.to_string()),
            AdjustmentError::EmptyItems
            | AdjustmentError::DuplicateProduct(_)
            | AdjustmentError::NegativeCount { .. }
            | AdjustmentError::InvalidPrecision { .. }
            | AdjustmentError::ReasonRequired => Self::Validation(err.to_string()),
            AdjustmentError::Ledger(e) => e.into(),
            AdjustmentError::Database(msg) => Self::Database(msg),
        }
    }
}
