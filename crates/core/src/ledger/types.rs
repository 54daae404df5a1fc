//! Ledger domain types.

use std::fmt;

use depot_shared::types::{
    ProductId, PurchaseOrderId, ShipmentId, StockAdjustmentId, WarehouseId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement.
///
/// Inbound types add to the on-hand quantity, outbound types subtract.
/// `Adjustment` carries a signed delta supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Goods received.
    In,
    /// Goods issued.
    Out,
    /// Goods arriving from another warehouse.
    TransferIn,
    /// Goods leaving for another warehouse.
    TransferOut,
    /// Signed correction after a physical count.
    Adjustment,
}

impl MovementType {
    /// Returns the string representation of the movement type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    /// Parses a movement type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN" => Some(Self::In),
            "OUT" => Some(Self::Out),
            "TRANSFER_IN" => Some(Self::TransferIn),
            "TRANSFER_OUT" => Some(Self::TransferOut),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }

    /// Returns true for types that add quantity.
    #[must_use]
    pub const fn is_inbound(&self) -> bool {
        matches!(self, Self::In | Self::TransferIn)
    }

    /// Returns true for types that subtract quantity.
    #[must_use]
    pub const fn is_outbound(&self) -> bool {
        matches!(self, Self::Out | Self::TransferOut)
    }

    /// Converts a requested quantity into the signed change it causes.
    #[must_use]
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        if self.is_outbound() { -quantity } else { quantity }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The business object that caused a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum MovementReference {
    /// Receipt of a purchase order.
    PurchaseOrder(PurchaseOrderId),
    /// Approval of a stock adjustment.
    Adjustment(StockAdjustmentId),
    /// Creation or cancellation of a shipment.
    Shipment(ShipmentId),
    /// Direct movement entered by a user.
    Manual,
}

impl MovementReference {
    /// Returns the stored reference type name.
    #[must_use]
    pub const fn reference_type(&self) -> &'static str {
        match self {
            Self::PurchaseOrder(_) => "PurchaseOrder",
            Self::Adjustment(_) => "Adjustment",
            Self::Shipment(_) => "Shipment",
            Self::Manual => "Manual",
        }
    }

    /// Returns the referenced record ID, if any.
    #[must_use]
    pub const fn reference_id(&self) -> Option<Uuid> {
        match self {
            Self::PurchaseOrder(id) => Some(id.into_inner()),
            Self::Adjustment(id) => Some(id.into_inner()),
            Self::Shipment(id) => Some(id.into_inner()),
            Self::Manual => None,
        }
    }

    /// Rebuilds a reference from its stored columns.
    pub fn from_parts(reference_type: &str, reference_id: Option<Uuid>) -> Option<Self> {
        match (reference_type, reference_id) {
            ("PurchaseOrder", Some(id)) => Some(Self::PurchaseOrder(PurchaseOrderId::from_uuid(id))),
            ("Adjustment", Some(id)) => Some(Self::Adjustment(StockAdjustmentId::from_uuid(id))),
            ("Shipment", Some(id)) => Some(Self::Shipment(ShipmentId::from_uuid(id))),
            ("Manual", None) => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Identity of a stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    /// Product held.
    pub product_id: ProductId,
    /// Warehouse holding it.
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    /// Creates a stock key.
    #[must_use]
    pub const fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
        }
    }
}

/// A requested quantity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    /// Stock row affected.
    pub key: StockKey,
    /// Movement type.
    pub movement_type: MovementType,
    /// Magnitude for IN/OUT/TRANSFER types, signed delta for ADJUSTMENT.
    pub quantity: Decimal,
    /// Causing business object.
    pub reference: MovementReference,
    /// Unit cost at the time of the movement.
    pub unit_cost: Option<Decimal>,
    /// Free-text note.
    pub note: Option<String>,
}

impl MovementRequest {
    /// Creates a movement request.
    #[must_use]
    pub const fn new(
        key: StockKey,
        movement_type: MovementType,
        quantity: Decimal,
        reference: MovementReference,
    ) -> Self {
        Self {
            key,
            movement_type,
            quantity,
            reference,
            unit_cost: None,
            note: None,
        }
    }

    /// Sets the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the unit cost.
    #[must_use]
    pub const fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// Signed change this request causes when applied.
    #[must_use]
    pub fn signed_delta(&self) -> Decimal {
        self.movement_type.signed(self.quantity)
    }
}

/// Outcome of applying a movement to a stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMovement {
    /// Quantity before the movement (zero for a new row).
    pub previous_quantity: Decimal,
    /// Quantity after the movement.
    pub new_quantity: Decimal,
    /// Signed change.
    pub delta: Decimal,
    /// True when the stock row did not exist yet.
    pub creates_stock: bool,
}
