//! Migration that blocks deleting stock movements.
//!
//! Movements are already protected against UPDATE. This adds the DELETE
//! guard while still letting an organization delete cascade through its
//! ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DELETE_GUARD_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_DELETE_GUARD_SQL).await?;
        Ok(())
    }
}

const DELETE_GUARD_SQL: &str = r"
-- ============================================================
-- STOCK MOVEMENTS CANNOT BE DELETED
-- A cascade from organizations runs inside the foreign key trigger,
-- so the nesting depth is above 1 there and 1 for a direct DELETE.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_movement_deletion()
RETURNS TRIGGER AS $$
BEGIN
    IF pg_trigger_depth() > 1 THEN
        RETURN OLD;
    END IF;
    RAISE EXCEPTION 'Stock movements are immutable';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_movement_delete
    BEFORE DELETE ON stock_movements
    FOR EACH ROW EXECUTE FUNCTION prevent_movement_deletion();
";

const DROP_DELETE_GUARD_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_prevent_movement_delete ON stock_movements;
DROP FUNCTION IF EXISTS prevent_movement_deletion();
";
