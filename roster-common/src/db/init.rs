//! Database initialization
//!
//! Creates the roster database on first run and brings older files up to
//! the current schema. Safe to call on every startup.

use crate::db::table_schemas::sync_all_table_schemas;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the roster database and ensure its schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Every connection to `sqlite::memory:` is a separate database, so the
/// pool is pinned to one connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create every table (idempotent) then add columns missing from old files
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_members_table(pool).await?;
    create_availability_table(pool).await?;
    create_shifts_table(pool).await?;
    create_shift_summary_table(pool).await?;
    create_generation_runs_table(pool).await?;

    sync_all_table_schemas(pool).await?;
    Ok(())
}

async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            grade INTEGER NOT NULL CHECK (grade >= 1),
            position TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_availability_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            shift_date TEXT NOT NULL,
            availability_type TEXT NOT NULL,
            UNIQUE(member_id, shift_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_availability_date ON availability(shift_date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_shifts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            shift_date TEXT NOT NULL,
            shift_type TEXT NOT NULL DEFAULT 'full_day',
            payment_type TEXT NOT NULL DEFAULT 'tier_A'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_member_date ON shifts(member_id, shift_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_shift_summary_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shift_summary (
            member_id INTEGER PRIMARY KEY REFERENCES members(id) ON DELETE CASCADE,
            total_days INTEGER NOT NULL DEFAULT 0,
            tier_a_days INTEGER NOT NULL DEFAULT 0,
            tier_b_days INTEGER NOT NULL DEFAULT 0,
            tier_b_ratio REAL NOT NULL DEFAULT 0,
            updated_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_generation_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS generation_runs (
            run_id TEXT PRIMARY KEY,
            started_at TIMESTAMP NOT NULL,
            finished_at TIMESTAMP NOT NULL,
            season_start TEXT NOT NULL,
            season_end TEXT NOT NULL,
            assignment_count INTEGER NOT NULL,
            anomaly_count INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
