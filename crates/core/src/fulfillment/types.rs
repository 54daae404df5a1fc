//! Fulfillment domain types.

use std::fmt;

use depot_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesOrderStatus {
    /// Newly created.
    Draft,
    /// Accepted, waiting to ship.
    Confirmed,
    /// A shipment has left.
    Shipped,
    /// The shipment arrived.
    Delivered,
    /// Abandoned.
    Cancelled,
    /// Sent back by the customer.
    Returned,
}

impl SalesOrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "CONFIRMED" => Some(Self::Confirmed),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            "RETURNED" => Some(Self::Returned),
            _ => None,
        }
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }
}

impl fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shipment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Created, stock issued, not yet handed to the carrier.
    Pending,
    /// With the carrier.
    Shipped,
    /// Arrived.
    Delivered,
    /// Called off; stock returned.
    Cancelled,
}

impl ShipmentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sales order line as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderLineInput {
    /// Product sold.
    pub product_id: ProductId,
    /// Quantity sold.
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

/// Sales order line with its total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSalesLine {
    /// Product sold.
    pub product_id: ProductId,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Tax on the line.
    pub tax_amount: Decimal,
    /// Discount on the line.
    pub discount_amount: Decimal,
    /// `quantity × unit_price + tax − discount`.
    pub total: Decimal,
}

/// Order-level totals, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesOrderTotals {
    /// Σ quantity × unit price.
    pub subtotal: Decimal,
    /// Σ tax.
    pub tax_amount: Decimal,
    /// Σ discount.
    pub discount_amount: Decimal,
    /// subtotal + tax − discount.
    pub total_amount: Decimal,
}
