//! Entity re-exports.

pub use super::organizations::Entity as Organizations;
pub use super::products::Entity as Products;
pub use super::purchase_order_items::Entity as PurchaseOrderItems;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::sales_order_items::Entity as SalesOrderItems;
pub use super::sales_orders::Entity as SalesOrders;
pub use super::shipments::Entity as Shipments;
pub use super::stock_adjustment_items::Entity as StockAdjustmentItems;
pub use super::stock_adjustments::Entity as StockAdjustments;
pub use super::stock_movements::Entity as StockMovements;
pub use super::stocks::Entity as Stocks;
pub use super::suppliers::Entity as Suppliers;
pub use super::warehouses::Entity as Warehouses;
