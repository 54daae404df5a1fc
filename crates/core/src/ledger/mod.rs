//! Stock movement ledger.
//!
//! Every change to an on-hand quantity goes through [`StockLedger::apply`],
//! which decides the resulting quantity and whether the movement is allowed.
//! The database layer persists the result together with exactly one
//! movement record.
//!
//! # Modules
//!
//! - `types` - Movement types, references and requests
//! - `error` - Ledger error types
//! - `service` - Quantity rules

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::StockLedger;
pub use types::{AppliedMovement, MovementReference, MovementRequest, MovementType, StockKey};
