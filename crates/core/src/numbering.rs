//! Human-readable document numbers.
//!
//! Numbers are `{PREFIX}-{YEAR}-{SEQUENCE:06}`. The sequence value comes from
//! an atomic per-organization counter in the database; this module only
//! names the counters and formats the result.

use std::fmt;

/// Kinds of documents that receive a generated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Purchase order (`PO`).
    PurchaseOrder,
    /// Stock adjustment (`ADJ`).
    StockAdjustment,
    /// Sales order (`SO`).
    SalesOrder,
    /// Shipment (`SH`).
    Shipment,
}

impl DocumentType {
    /// Number prefix.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::PurchaseOrder => "PO",
            Self::StockAdjustment => "ADJ",
            Self::SalesOrder => "SO",
            Self::Shipment => "SH",
        }
    }

    /// Counter key stored with the sequence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseOrder => "purchase_order",
            Self::StockAdjustment => "stock_adjustment",
            Self::SalesOrder => "sales_order",
            Self::Shipment => "shipment",
        }
    }

    /// Formats a document number from a year and sequence value.
    #[must_use]
    pub fn format_number(&self, year: i32, sequence: i64) -> String {
        format!("{}-{year}-{sequence:06}", self.prefix())
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
