//! Purchase order domain types.

use std::fmt;

use depot_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Purchase order status.
///
/// Valid transitions:
/// - Draft → Ordered
/// - Draft → Cancelled
/// - Ordered → Cancelled
/// - Draft | Ordered → Received (receiving only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    /// Being prepared; fields and items may change.
    Draft,
    /// Sent to the supplier.
    Ordered,
    /// Goods received into stock (terminal).
    Received,
    /// Abandoned (terminal).
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Ordered => "ORDERED",
            Self::Received => "RECEIVED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "ORDERED" => Some(Self::Ordered),
            "RECEIVED" => Some(Self::Received),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if fields and items may still change.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Line as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineInput {
    /// Product ordered.
    pub product_id: ProductId,
    /// Quantity ordered.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
}

/// Line with its computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedPurchaseLine {
    /// Product ordered.
    pub product_id: ProductId,
    /// Quantity ordered.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity × unit_price`.
    pub total: Decimal,
}

/// Lines plus the cached order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedPurchaseOrder {
    /// Priced lines in input order.
    pub lines: Vec<PricedPurchaseLine>,
    /// Sum of line totals.
    pub total_amount: Decimal,
}
