//! Fulfillment error types.

use depot_shared::AppError;
use depot_shared::types::{SalesOrderId, ShipmentId};
use thiserror::Error;

use crate::fulfillment::types::{SalesOrderStatus, ShipmentStatus};
use crate::ledger::LedgerError;

/// Errors that can occur during sales order and shipment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Sales order not found in the organization.
    #[error("Sales order {0} not found")]
    SalesOrderNotFound(SalesOrderId),

    /// Shipment not found in the organization.
    #[error("Shipment {0} not found")]
    ShipmentNotFound(ShipmentId),

    /// Sales order status change not allowed.
    #[error("Invalid sales order transition from {from} to {to}")]
    InvalidOrderTransition {
        /// Current status.
        from: SalesOrderStatus,
        /// Requested status.
        to: SalesOrderStatus,
    },

    /// Shipment status change not allowed.
    #[error("Invalid shipment transition from {from} to {to}")]
    InvalidShipmentTransition {
        /// Current status.
        from: ShipmentStatus,
        /// Requested status.
        to: ShipmentStatus,
    },

    /// A shipment can only be created for a CONFIRMED order.
    #[error("Sales order is {0}, only CONFIRMED orders can be shipped")]
    OrderNotShippable(SalesOrderStatus),

    /// Delivery requires the order to be SHIPPED.
    #[error("Sales order is {0}, only SHIPPED orders can be delivered")]
    OrderNotShipped(SalesOrderStatus),

    /// Order has no lines.
    #[error("Sales order must have at least one item")]
    EmptyOrder,

    /// A line failed validation.
    #[error("Item {index}: {reason}")]
    InvalidLine {
        /// Zero-based line index.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Stock movement failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl FulfillmentError {
    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SalesOrderNotFound(_) => "SALES_ORDER_NOT_FOUND",
            Self::ShipmentNotFound(_) => "SHIPMENT_NOT_FOUND",
            Self::InvalidOrderTransition { .. } => "INVALID_ORDER_TRANSITION",
            Self::InvalidShipmentTransition { .. } => "INVALID_SHIPMENT_TRANSITION",
            Self::OrderNotShippable(_) => "ORDER_NOT_SHIPPABLE",
            Self::OrderNotShipped(_) => "ORDER_NOT_SHIPPED",
            Self::EmptyOrder => "EMPTY_ORDER",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::SalesOrderNotFound(_) | FulfillmentError::ShipmentNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            FulfillmentError::InvalidOrderTransition { .. }
            | FulfillmentError::InvalidShipmentTransition { .. }
            | FulfillmentError::OrderNotShippable(_)
            | FulfillmentError::OrderNotShipped(_) => Self::InvalidState(err.to_string()),
            FulfillmentError::EmptyOrder | FulfillmentError::InvalidLine { .. } => {
                Self::Validation(err.to_string())
            }
            FulfillmentError::Ledger(e) => e.into(),
            FulfillmentError::Database(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_shipped_is_invalid_state() {
        let err = FulfillmentError::OrderNotShipped(SalesOrderStatus::Confirmed);
        assert_eq!(err.error_code(), "ORDER_NOT_SHIPPED");
        assert!(err.to_string().contains("CONFIRMED"));
        assert!(matches!(AppError::from(err), AppError::InvalidState(_)));
    }

    #[test]
    fn test_not_found_variants() {
        assert!(matches!(
            AppError::from(FulfillmentError::SalesOrderNotFound(SalesOrderId::new())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(FulfillmentError::ShipmentNotFound(ShipmentId::new())),
            AppError::NotFound(_)
        ));
    }
}
