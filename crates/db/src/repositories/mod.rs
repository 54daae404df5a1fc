//! Repository abstractions for data access.
//!
//! Every public method opens its own transaction scoped to the caller's
//! organization. All stock changes go through [`stock::apply_movement`].

pub mod adjustment;
pub mod fulfillment;
pub mod purchase_order;
pub mod sequence;
pub mod stock;

pub use adjustment::{
    AdjustmentRepository, AdjustmentWithItems, CreateAdjustmentInput, UpdateAdjustmentInput,
};
pub use fulfillment::{CreateShipmentInput, FulfillmentRepository, SalesOrderWithItems};
pub use purchase_order::{
    CreatePurchaseOrderInput, PurchaseOrderRepository, PurchaseOrderWithItems,
    UpdatePurchaseOrderInput,
};
pub use sequence::next_document_number;
pub use stock::{MovementFilter, StockLedgerRepository, StockMovementResult, apply_movement};
