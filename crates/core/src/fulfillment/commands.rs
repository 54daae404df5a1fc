//! Commands that create sales orders.
//!
//! A paid invoice elsewhere in the product turns into a sales order by
//! publishing an [`InvoicePaid`] event; fulfillment converts it into the
//! same [`CreateSalesOrderCommand`] the API uses.

use chrono::{DateTime, NaiveDate, Utc};
use depot_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fulfillment::types::SalesOrderLineInput;

/// Input for creating a sales order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrderCommand {
    /// Customer the order is for.
    pub customer_id: Uuid,
    /// Order date.
    pub order_date: NaiveDate,
    /// Promised ship date.
    pub expected_shipment_date: Option<NaiveDate>,
    /// Delivery address.
    pub shipping_address: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Order lines.
    pub lines: Vec<SalesOrderLineInput>,
}

/// A line on a paid invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Product sold; `None` for service lines.
    pub product_id: Option<ProductId>,
    /// Quantity.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Tax on the line.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Discount on the line.
    #[serde(default)]
    pub discount_amount: Decimal,
}

/// Event published when an invoice becomes fully paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaid {
    /// Invoice that was paid.
    pub invoice_id: Uuid,
    /// Invoice number, for the order notes.
    pub invoice_number: String,
    /// Customer billed.
    pub customer_id: Uuid,
    /// When payment completed.
    pub paid_at: DateTime<Utc>,
    /// Delivery address, if the invoice carries one.
    pub shipping_address: Option<String>,
    /// Invoice lines.
    pub lines: Vec<InvoiceLine>,
}

impl CreateSalesOrderCommand {
    /// Builds an order for the stocked lines of a paid invoice.
    ///
    /// Returns `None` when the invoice has no product lines.
    #[must_use]
    pub fn from_invoice_paid(event: &InvoicePaid) -> Option<Self> {
        let lines: Vec<SalesOrderLineInput> = event
            .lines
            .iter()
            .filter_map(|line| {
                line.product_id.map(|product_id| SalesOrderLineInput {
                    product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    tax_amount: line.tax_amount,
                    discount_amount: line.discount_amount,
                })
            })
            .collect();

        if lines.is_empty() {
            return None;
        }

        Some(Self {
            customer_id: event.customer_id,
            order_date: event.paid_at.date_naive(),
            expected_shipment_date: None,
            shipping_address: event.shipping_address.clone(),
            notes: Some(format!("Created from paid invoice {}", event.invoice_number)),
            lines,
        })
    }
}
