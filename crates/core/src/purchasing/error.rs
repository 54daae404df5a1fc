//! Purchasing error types.

use depot_shared::AppError;
use depot_shared::types::PurchaseOrderId;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::purchasing::types::PurchaseOrderStatus;

/// Errors that can occur during purchase order operations.
#[derive(Debug, Error)]
pub enum PurchasingError {
    /// Purchase order not found in the organization.
    #[error("Purchase order {0} not found")]
    NotFound(PurchaseOrderId),

    /// Purchase order was already received.
    #[error("Purchase order {0} has already been received")]
    AlreadyReceived(PurchaseOrderId),

    /// Purchase order cannot be received from its current status.
    #[error("Cannot receive a {0} purchase order")]
    NotReceivable(PurchaseOrderStatus),

    /// Fields or items changed outside DRAFT.
    #[error("Only DRAFT purchase orders can be edited, order is {0}")]
    NotDraft(PurchaseOrderStatus),

    /// Status change not allowed.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PurchaseOrderStatus,
        /// Requested status.
        to: PurchaseOrderStatus,
    },

    /// Order has no items.
    #[error("Purchase order must have at least one item")]
    EmptyOrder,

    /// A line failed validation.
    #[error("Item {index}: {reason}")]
    InvalidLine {
        /// Zero-based line index.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Supplier does not exist in the organization.
    #[error("Supplier {0} not found")]
    SupplierNotFound(uuid::Uuid),

    /// Stock movement failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PurchasingError {
    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PURCHASE_ORDER_NOT_FOUND",
            Self::AlreadyReceived(_) => "ALREADY_RECEIVED",
            Self::NotReceivable(_) => "NOT_RECEIVABLE",
            Self::NotDraft(_) => "NOT_DRAFT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::EmptyOrder => "EMPTY_ORDER",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<PurchasingError> for AppError {
    fn from(err: PurchasingError) -> Self {
        match err {
            PurchasingError::NotFound(_) | PurchasingError::SupplierNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            PurchasingError::AlreadyReceived(_)
            | PurchasingError::NotReceivable(_)
            | PurchasingError::NotDraft(_)
            | PurchasingError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
            PurchasingError::EmptyOrder | PurchasingError::InvalidLine { .. } => {
                Self::Validation(err.to_string())
            }
            PurchasingError::Ledger(e) => e.into(),
            PurchasingError::Database(msg) => Self::Database(msg),
        }
    }
}
