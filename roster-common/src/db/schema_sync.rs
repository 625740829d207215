//! Automatic schema synchronization
//!
//! Rosters created by older releases lack columns that later releases rely
//! on (`members.position` arrived with the leadership guarantee). Each table
//! declares its expected columns; on startup any missing column is added
//! with `ALTER TABLE ADD COLUMN`. Type drift is only reported.
//!
//! Initialization order:
//! 1. `CREATE TABLE IF NOT EXISTS` for every table
//! 2. Column sync (this module)

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "TIMESTAMP")
    pub sql_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value (SQL literal, e.g. `"1"` or `"'x'"`)
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// `ALTER TABLE` statement adding this column
    ///
    /// SQLite only accepts NOT NULL on an added column when a DEFAULT is
    /// given, so NOT NULL is dropped otherwise.
    pub fn add_column_sql(&self, table: &str) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, self.name, self.sql_type
        );
        match (&self.default_value, self.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, _) => {}
        }
        sql
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
}

/// Expected schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Read the actual columns of a table, in column order
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
        })
        .collect();
    columns.sort_by_key(|c| c.cid);

    Ok(columns)
}

/// Expected columns absent from `actual`
pub fn missing_columns(
    expected: &[ColumnDefinition],
    actual: &[ActualColumn],
) -> Vec<ColumnDefinition> {
    expected
        .iter()
        .filter(|col| !actual.iter().any(|a| a.name.eq_ignore_ascii_case(&col.name)))
        .cloned()
        .collect()
}

/// SQLite type-affinity compatibility
fn types_compatible(expected: &str, actual: &str) -> bool {
    let affinity = |t: &str| {
        let t = t.to_uppercase();
        if t.contains("INT") {
            "INTEGER"
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            "TEXT"
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            "REAL"
        } else {
            "NUMERIC"
        }
    };
    expected.eq_ignore_ascii_case(actual) || affinity(expected) == affinity(actual)
}

/// Add missing columns to one table; returns the names added
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<Vec<String>> {
    let table_name = T::table_name();
    let expected = T::expected_columns();
    let actual = introspect_table(pool, table_name).await?;

    if actual.is_empty() {
        warn!("Schema sync: table '{}' does not exist", table_name);
        return Ok(Vec::new());
    }

    for col in &expected {
        if let Some(found) = actual.iter().find(|a| a.name.eq_ignore_ascii_case(&col.name)) {
            if !types_compatible(&col.sql_type, &found.type_name) {
                warn!(
                    "Type mismatch in {}.{}: expected '{}', found '{}'",
                    table_name, col.name, col.sql_type, found.type_name
                );
            }
        }
    }

    let missing = missing_columns(&expected, &actual);
    if missing.is_empty() {
        debug!("Schema up to date for '{}'", table_name);
        return Ok(Vec::new());
    }

    let mut added = Vec::with_capacity(missing.len());
    for column in missing {
        info!("Adding column {}.{} ({})", table_name, column.name, column.sql_type);
        match sqlx::query(&column.add_column_sql(table_name)).execute(pool).await {
            Ok(_) => added.push(column.name),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                debug!("Column {}.{} already present", table_name, column.name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(added)
}
