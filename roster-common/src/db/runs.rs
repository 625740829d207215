//! Generation run audit log

use crate::models::{format_date, parse_date};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

/// One completed generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    pub assignment_count: u32,
    pub anomaly_count: u32,
}

pub async fn record_run(conn: &mut SqliteConnection, run: &RunRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO generation_runs
            (run_id, started_at, finished_at, season_start, season_end, assignment_count, anomaly_count)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(run.started_at)
    .bind(run.finished_at)
    .bind(format_date(run.season_start))
    .bind(format_date(run.season_end))
    .bind(run.assignment_count as i64)
    .bind(run.anomaly_count as i64)
    .execute(conn)
    .await?;

    Ok(())
}

/// Completed runs, most recent first
pub async fn list_runs<'e, E>(executor: E) -> Result<Vec<RunRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, DateTime<Utc>, DateTime<Utc>, String, String, i64, i64)> =
        sqlx::query_as(
            r#"
            SELECT run_id, started_at, finished_at, season_start, season_end, assignment_count, anomaly_count
            FROM generation_runs
            ORDER BY started_at DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

    rows.into_iter()
        .map(
            |(run_id, started_at, finished_at, season_start, season_end, assignments, anomalies)| {
                Ok(RunRecord {
                    run_id: Uuid::parse_str(&run_id).map_err(|e| {
                        Error::Internal(format!("Invalid run id '{}': {}", run_id, e))
                    })?,
                    started_at,
                    finished_at,
                    season_start: parse_date(&season_start)?,
                    season_end: parse_date(&season_end)?,
                    assignment_count: assignments.max(0) as u32,
                    anomaly_count: anomalies.max(0) as u32,
                })
            },
        )
        .collect()
}
