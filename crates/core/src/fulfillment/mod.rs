//! Sales order fulfillment.
//!
//! Sales orders move DRAFT → CONFIRMED → SHIPPED → DELIVERED. Creating a
//! shipment ships the order and issues its lines from a warehouse;
//! delivering the shipment delivers the order.
//!
//! # Modules
//!
//! - `types` - Order and shipment statuses, lines, totals
//! - `commands` - Inputs for creating orders, including from paid invoices
//! - `error` - Fulfillment error types
//! - `service` - Pricing and transition rules

pub mod commands;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use commands::{CreateSalesOrderCommand, InvoiceLine, InvoicePaid};
pub use error::FulfillmentError;
pub use service::{FulfillmentService, ShipmentTransition};
pub use types::{
    PricedSalesLine, SalesOrderLineInput, SalesOrderStatus, SalesOrderTotals, ShipmentStatus,
};
