//! Audit events for inventory changes.
//!
//! Events are dispatched after the owning transaction commits. Dispatch is
//! best-effort: a failing sink is logged and never undoes the change.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use depot_shared::types::{OrganizationId, UserId};

/// Action recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Manual stock movement.
    AdjustStock,
    /// Purchase order created.
    CreatePurchaseOrder,
    /// Purchase order edited or status changed.
    UpdatePurchaseOrder,
    /// Purchase order received into stock.
    ReceivePurchaseOrder,
    /// Stock adjustment created.
    CreateStockAdjustment,
    /// Stock adjustment edited.
    UpdateStockAdjustment,
    /// Stock adjustment approved.
    ApproveStockAdjustment,
    /// Stock adjustment deleted.
    DeleteStockAdjustment,
    /// Sales order created.
    CreateSalesOrder,
    /// Sales order status changed.
    UpdateSalesOrderStatus,
    /// Shipment created.
    CreateShipment,
    /// Shipment status changed.
    UpdateShipmentStatus,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AdjustStock => "ADJUST_STOCK",
            Self::CreatePurchaseOrder => "CREATE_PURCHASE_ORDER",
            Self::UpdatePurchaseOrder => "UPDATE_PURCHASE_ORDER",
            Self::ReceivePurchaseOrder => "RECEIVE_PURCHASE_ORDER",
            Self::CreateStockAdjustment => "CREATE_STOCK_ADJUSTMENT",
            Self::UpdateStockAdjustment => "UPDATE_STOCK_ADJUSTMENT",
            Self::ApproveStockAdjustment => "APPROVE_STOCK_ADJUSTMENT",
            Self::DeleteStockAdjustment => "DELETE_STOCK_ADJUSTMENT",
            Self::CreateSalesOrder => "CREATE_SALES_ORDER",
            Self::UpdateSalesOrderStatus => "UPDATE_SALES_ORDER_STATUS",
            Self::CreateShipment => "CREATE_SHIPMENT",
            Self::UpdateShipmentStatus => "UPDATE_SHIPMENT_STATUS",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Tenant the change belongs to.
    pub organization_id: OrganizationId,
    /// User who made the change.
    pub actor_id: UserId,
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity changed, e.g. `PurchaseOrder`.
    pub entity_type: &'static str,
    /// Id of the entity changed.
    pub entity_id: Uuid,
    /// State before the change.
    pub before: Option<Value>,
    /// State after the change.
    pub after: Option<Value>,
    /// Extra context.
    pub metadata: Option<Value>,
    /// When the change committed.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        actor_id: UserId,
        action: AuditAction,
        entity_type: &'static str,
        entity_id: Uuid,
    ) -> Self {
        Self {
            organization_id,
            actor_id,
            action,
            entity_type,
            entity_id,
            before: None,
            after: None,
            metadata: None,
            occurred_at: Utc::now(),
        }
    }

    /// Sets the state before the change.
    #[must_use]
    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }

    /// Sets the state after the change.
    #[must_use]
    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }

    /// Sets extra context.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Errors raised by an audit sink.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The sink could not accept the event.
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit events.
#[cfg_attr(test, mockall::automock)]
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Dispatches an event, logging and swallowing sink failures.
pub fn emit(sink: &dyn AuditSink, event: &AuditEvent) {
    if let Err(e) = sink.record(event) {
        tracing::warn!(
            error = %e,
            action = %event.action,
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            "Failed to record audit event"
        );
    }
}

/// Writes events to the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload = serde_json::to_string(event).map_err(|e| AuditError::Unavailable(e.to_string()))?;
        tracing::info!(
            target: "audit",
            organization_id = %event.organization_id,
            actor_id = %event.actor_id,
            action = %event.action,
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            event = %payload,
            "audit"
        );
        Ok(())
    }
}

/// Keeps events in memory, for tests and local inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns recorded events with the given action.
    #[must_use]
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.action == action)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}
