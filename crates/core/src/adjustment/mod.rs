//! Stock count adjustments.
//!
//! An adjustment records counted quantities for a warehouse. While DRAFT it
//! may be edited or deleted; approval moves every counted product to its
//! counted quantity through the ledger and is final.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::AdjustmentError;
pub use service::AdjustmentService;
pub use types::{AdjustmentApproval, AdjustmentItemInput, AdjustmentStatus, CountedItem};
