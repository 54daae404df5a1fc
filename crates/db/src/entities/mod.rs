//! `SeaORM` entity definitions.
//!
//! Fields mirror table columns one to one; the migration is their documentation.

#![allow(missing_docs)]

pub mod prelude;

pub mod organizations;
pub mod products;
pub mod purchase_order_items;
pub mod purchase_orders;
pub mod sales_order_items;
pub mod sales_orders;
pub mod sea_orm_active_enums;
pub mod shipments;
pub mod stock_adjustment_items;
pub mod stock_adjustments;
pub mod stock_movements;
pub mod stocks;
pub mod suppliers;
pub mod warehouses;
