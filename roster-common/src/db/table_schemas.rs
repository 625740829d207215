//! Table Schema Definitions
//!
//! Expected columns of the tables whose shape has changed between
//! releases. Synced on every startup after the CREATE TABLE pass.

use crate::db::schema_sync::{sync_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Members table schema
pub struct MembersTableSchema;

impl TableSchema for MembersTableSchema {
    fn table_name() -> &'static str {
        "members"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER"),
            ColumnDefinition::new("name", "TEXT").not_null(),
            ColumnDefinition::new("grade", "INTEGER").not_null(),
            // Leadership label, absent from the earliest rosters
            ColumnDefinition::new("position", "TEXT"),
            ColumnDefinition::new("is_active", "INTEGER")
                .not_null()
                .default("1"),
        ]
    }
}

/// Shifts table schema
pub struct ShiftsTableSchema;

impl TableSchema for ShiftsTableSchema {
    fn table_name() -> &'static str {
        "shifts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER"),
            ColumnDefinition::new("member_id", "INTEGER").not_null(),
            ColumnDefinition::new("shift_date", "TEXT").not_null(),
            ColumnDefinition::new("shift_type", "TEXT")
                .not_null()
                .default("'full_day'"),
            ColumnDefinition::new("payment_type", "TEXT")
                .not_null()
                .default("'tier_A'"),
        ]
    }
}

/// Shift summary table schema
pub struct ShiftSummaryTableSchema;

impl TableSchema for ShiftSummaryTableSchema {
    fn table_name() -> &'static str {
        "shift_summary"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("member_id", "INTEGER"),
            ColumnDefinition::new("total_days", "INTEGER")
                .not_null()
                .default("0"),
            ColumnDefinition::new("tier_a_days", "INTEGER")
                .not_null()
                .default("0"),
            ColumnDefinition::new("tier_b_days", "INTEGER")
                .not_null()
                .default("0"),
            ColumnDefinition::new("tier_b_ratio", "REAL")
                .not_null()
                .default("0"),
            ColumnDefinition::new("updated_at", "TIMESTAMP"),
        ]
    }
}

/// Synchronize all table schemas
///
/// Returns the number of columns added.
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<usize> {
    let mut added = 0;
    added += sync_table::<MembersTableSchema>(pool).await?.len();
    added += sync_table::<ShiftsTableSchema>(pool).await?.len();
    added += sync_table::<ShiftSummaryTableSchema>(pool).await?.len();

    if added > 0 {
        info!("Schema sync added {} columns", added);
    }
    Ok(added)
}
