//! Row-Level Security (RLS) context management.
//!
//! Every workflow opens its transaction through [`begin_scoped`], which sets
//! `app.current_organization_id` with `SET LOCAL` so the tenant policies in
//! the migration apply for the lifetime of the transaction only.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

use depot_shared::types::OrganizationId;

fn set_local_sql(organization_id: OrganizationId) -> String {
    format!("SET LOCAL app.current_organization_id = '{organization_id}'")
}

/// Sets the RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the RLS context cannot be set.
pub async fn set_rls_context(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&set_local_sql(organization_id))
        .await?;
    Ok(())
}

/// Begins a transaction scoped to one organization.
///
/// # Errors
///
/// Returns an error if the transaction cannot be started or the RLS
/// context cannot be set.
pub async fn begin_scoped(
    db: &DatabaseConnection,
    organization_id: OrganizationId,
) -> Result<DatabaseTransaction, DbErr> {
    let txn = db.begin().await?;
    set_rls_context(&txn, organization_id).await?;
    Ok(txn)
}
