//! Per-organization document number sequences.

use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, Statement};

use depot_core::numbering::DocumentType;
use depot_shared::types::OrganizationId;

const NEXT_VALUE_SQL: &str = r"
INSERT INTO document_sequences (organization_id, document_type, year, last_value)
VALUES ($1, $2, $3, 1)
ON CONFLICT (organization_id, document_type, year)
DO UPDATE SET last_value = document_sequences.last_value + 1
RETURNING last_value
";

/// Allocates the next number for a document type and year.
///
/// The counter row is created on first use and incremented atomically, so
/// concurrent callers never receive the same number. The allocation is part
/// of the caller's transaction and is released again on rollback.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn next_document_number(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    document_type: DocumentType,
    year: i32,
) -> Result<String, DbErr> {
    let row = txn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEXT_VALUE_SQL,
            [
                organization_id.into_inner().into(),
                document_type.as_str().into(),
                year.into(),
            ],
        ))
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("document_sequences".to_string()))?;

    let sequence: i64 = row.try_get("", "last_value")?;
    Ok(document_type.format_number(year, sequence))
}
