//! Stock adjustment domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use depot_shared::types::{ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock adjustment status.
///
/// DRAFT → APPROVED is the only transition; APPROVED and CANCELLED are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentStatus {
    /// Editable and deletable.
    Draft,
    /// Applied to stock.
    Approved,
    /// Abandoned.
    Cancelled,
}

impl AdjustmentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Approved => "APPROVED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "APPROVED" => Some(Self::Approved),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true while the adjustment may be changed or deleted.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counted line as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentItemInput {
    /// Product counted.
    pub product_id: ProductId,
    /// Quantity found on the shelf.
    pub actual_quantity: Decimal,
    /// Optional note for this line.
    pub note: Option<String>,
}

/// Counted line with the system snapshot it was compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedItem {
    /// Product counted.
    pub product_id: ProductId,
    /// On-hand quantity when the line was entered.
    pub system_quantity: Decimal,
    /// Quantity found on the shelf.
    pub actual_quantity: Decimal,
    /// `actual_quantity - system_quantity`.
    pub difference: Decimal,
    /// Optional note for this line.
    pub note: Option<String>,
}

/// Approval record written onto the adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentApproval {
    /// Status after approval.
    pub new_status: AdjustmentStatus,
    /// Approver.
    pub approved_by: UserId,
    /// Approval time.
    pub approved_at: DateTime<Utc>,
}
