//! Purchase orders and receiving.
//!
//! # Modules
//!
//! - `types` - Status and line types
//! - `error` - Purchasing error types
//! - `service` - Pricing, edit and receive rules

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::PurchasingError;
pub use service::PurchaseOrderService;
pub use types::{PricedPurchaseLine, PricedPurchaseOrder, PurchaseOrderLineInput, PurchaseOrderStatus};
