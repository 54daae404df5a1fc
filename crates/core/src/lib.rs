//! Core inventory logic for Depot.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Quantity arithmetic, status machines, totals and numbering live here; the
//! `depot-db` crate runs them inside database transactions.
//!
//! # Modules
//!
//! - `ledger` - Stock movement rules (the single choke point for quantity changes)
//! - `purchasing` - Purchase order pricing, editing and receiving rules
//! - `adjustment` - Stock count adjustments (draft → approve)
//! - `fulfillment` - Sales order and shipment state machines
//! - `numbering` - Human-readable document numbers
//! - `audit` - Best-effort audit event dispatch
//! - `permission` - Permission names and access checks
//! - `precision` - Scale limits of stored quantities and amounts

pub mod adjustment;
pub mod audit;
pub mod fulfillment;
pub mod ledger;
pub mod numbering;
pub mod permission;
pub mod precision;
pub mod purchasing;
