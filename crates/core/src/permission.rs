//! Permission names and access checks.
//!
//! Permissions travel in the access token. Owners and admins hold every
//! permission implicitly.

use std::collections::HashSet;
use std::fmt;

use depot_shared::AppError;
use depot_shared::auth::Claims;
use depot_shared::types::{OrganizationId, UserId};

/// A named permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read stock levels and movement history.
    StockView,
    /// Post manual stock movements.
    StockAdjust,
    /// Read purchase orders.
    PurchaseOrdersView,
    /// Create and edit purchase orders.
    PurchaseOrdersManage,
    /// Receive purchase orders into stock.
    PurchaseOrdersReceive,
    /// Read stock adjustments.
    AdjustmentsView,
    /// Create, edit and delete draft adjustments.
    AdjustmentsManage,
    /// Approve adjustments.
    AdjustmentsApprove,
    /// Read sales orders.
    SalesOrdersView,
    /// Create sales orders and change their status.
    SalesOrdersManage,
    /// Read shipments.
    ShipmentsView,
    /// Create shipments and change their status.
    ShipmentsManage,
}

impl Permission {
    /// Every permission.
    pub const ALL: [Self; 12] = [
        Self::StockView,
        Self::StockAdjust,
        Self::PurchaseOrdersView,
        Self::PurchaseOrdersManage,
        Self::PurchaseOrdersReceive,
        Self::AdjustmentsView,
        Self::AdjustmentsManage,
        Self::AdjustmentsApprove,
        Self::SalesOrdersView,
        Self::SalesOrdersManage,
        Self::ShipmentsView,
        Self::ShipmentsManage,
    ];

    /// Returns the string representation of the permission.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StockView => "inventory.stock.view",
            Self::StockAdjust => "inventory.stock.adjust",
            Self::PurchaseOrdersView => "inventory.purchase_orders.view",
            Self::PurchaseOrdersManage => "inventory.purchase_orders.manage",
            Self::PurchaseOrdersReceive => "inventory.purchase_orders.receive",
            Self::AdjustmentsView => "inventory.adjustments.view",
            Self::AdjustmentsManage => "inventory.adjustments.manage",
            Self::AdjustmentsApprove => "inventory.adjustments.approve",
            Self::SalesOrdersView => "sales.orders.view",
            Self::SalesOrdersManage => "sales.orders.manage",
            Self::ShipmentsView => "sales.shipments.view",
            Self::ShipmentsManage => "sales.shipments.manage",
        }
    }

    /// Parses a permission from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Access check failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    /// The caller lacks the permission.
    #[error("Missing permission: {0}")]
    Forbidden(Permission),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        Self::Forbidden(err.to_string())
    }
}

/// Who is calling, and what they may do.
#[derive(Debug, Clone)]
pub struct AccessContext {
    /// Tenant every query is scoped to.
    pub organization_id: OrganizationId,
    /// Acting user.
    pub user_id: UserId,
    /// Role in the organization.
    pub role: String,
    granted: HashSet<Permission>,
}

impl AccessContext {
    /// Builds a context from a role and permission names. Unknown names are ignored.
    #[must_use]
    pub fn new<I, S>(organization_id: OrganizationId, user_id: UserId, role: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let granted = if Self::is_superuser(role) {
            Permission::ALL.into_iter().collect()
        } else {
            permissions
                .into_iter()
                .filter_map(|p| Permission::parse(p.as_ref()))
                .collect()
        };

        Self {
            organization_id,
            user_id,
            role: role.to_string(),
            granted,
        }
    }

    /// Builds a context from token claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(
            OrganizationId::from_uuid(claims.organization_id()),
            UserId::from_uuid(claims.user_id()),
            &claims.role,
            &claims.permissions,
        )
    }

    fn is_superuser(role: &str) -> bool {
        matches!(role.to_lowercase().as_str(), "owner" | "admin")
    }

    /// Returns true if the permission is granted.
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    /// Fails unless the permission is granted.
    pub fn require(&self, permission: Permission) -> Result<(), AccessError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AccessError::Forbidden(permission))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: &str, permissions: &[&str]) -> AccessContext {
        AccessContext::new(OrganizationId::new(), UserId::new(), role, permissions)
    }

    #[test]
    fn test_parse_round_trips_every_permission() {
        for permission in Permission::ALL {
            assert_eq!(Permission::parse(permission.as_str()), Some(permission));
        }
        assert_eq!(Permission::parse("inventory.everything"), None);
    }

    #[test]
    fn test_owner_and_admin_hold_everything() {
        for role in ["owner", "Admin"] {
            let ctx = context(role, &[]);
            assert!(Permission::ALL.iter().all(|p| ctx.has(*p)));
        }
    }

    #[test]
    fn test_member_holds_only_granted() {
        let ctx = context("member", &["inventory.stock.view", "not.a.permission"]);
        assert!(ctx.require(Permission::StockView).is_ok());
        assert_eq!(
            ctx.require(Permission::AdjustmentsApprove),
            Err(AccessError::Forbidden(Permission::AdjustmentsApprove))
        );
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let err: AppError = AccessError::Forbidden(Permission::ShipmentsManage).into();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("sales.shipments.manage"));
    }

    #[test]
    fn test_from_claims() {
        let user = uuid::Uuid::new_v4();
        let org = uuid::Uuid::new_v4();
        let claims = Claims::new(
            user,
            org,
            "viewer",
            vec!["sales.orders.view".to_string()],
            chrono::Utc::now(),
        );
        let ctx = AccessContext::from_claims(&claims);
        assert_eq!(ctx.organization_id.into_inner(), org);
        assert_eq!(ctx.user_id.into_inner(), user);
        assert!(ctx.has(Permission::SalesOrdersView));
        assert!(!ctx.has(Permission::SalesOrdersManage));
    }
}
