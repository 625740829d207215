//! Shift summary table
//!
//! The summary is a derived cache of the shift table. It is only ever
//! rebuilt wholesale from the shift rows currently stored.

use crate::db::members::list_members;
use crate::db::shifts::load_shifts;
use crate::models::{MemberId, SummaryRecord};
use crate::summary::aggregate_summary;
use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::info;

/// Summary row joined with the member's name and grade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub grade: u32,
    #[serde(flatten)]
    pub record: SummaryRecord,
}

type SummaryRow = (i64, i64, i64, i64, f64);

fn record_from_row(
    (member_id, total_days, tier_a_days, tier_b_days, tier_b_ratio): SummaryRow,
) -> Result<SummaryRecord> {
    let count = |value: i64| {
        u32::try_from(value).map_err(|_| {
            Error::Internal(format!(
                "Negative day count {} in summary of member {}",
                value, member_id
            ))
        })
    };
    Ok(SummaryRecord {
        member_id,
        total_days: count(total_days)?,
        tier_a_days: count(tier_a_days)?,
        tier_b_days: count(tier_b_days)?,
        tier_b_ratio_percent: tier_b_ratio,
    })
}

/// Replace every summary row
pub async fn replace_summary(conn: &mut SqliteConnection, records: &[SummaryRecord]) -> Result<()> {
    sqlx::query("DELETE FROM shift_summary")
        .execute(&mut *conn)
        .await?;

    for record in records {
        sqlx::query(
            r#"
            INSERT INTO shift_summary
                (member_id, total_days, tier_a_days, tier_b_days, tier_b_ratio, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(record.member_id)
        .bind(record.total_days as i64)
        .bind(record.tier_a_days as i64)
        .bind(record.tier_b_days as i64)
        .bind(record.tier_b_ratio_percent)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Rebuild the summary from the stored shift rows
///
/// Reads and writes on the same connection, so inside a transaction the
/// summary reflects exactly the shifts written earlier in it.
pub async fn recompute_summary(conn: &mut SqliteConnection) -> Result<Vec<SummaryRecord>> {
    let roster = list_members(&mut *conn).await?;
    let shifts = load_shifts(&mut *conn).await?;
    let summary = aggregate_summary(&roster, &shifts);

    replace_summary(conn, &summary).await?;
    info!(
        "Summary rebuilt: {} members, {} shift rows",
        summary.len(),
        shifts.len()
    );
    Ok(summary)
}

/// Stored summary rows in member id order
pub async fn load_summary<'e, E>(executor: E) -> Result<Vec<SummaryRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<SummaryRow> = sqlx::query_as(
        r#"
        SELECT member_id, total_days, tier_a_days, tier_b_days, tier_b_ratio
        FROM shift_summary
        ORDER BY member_id
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(record_from_row).collect()
}

/// Summary with member names, in member id order
pub async fn load_summary_view<'e, E>(executor: E) -> Result<Vec<SummaryEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, i64, i64, i64, i64, i64, f64)> = sqlx::query_as(
        r#"
        SELECT m.name, m.grade, s.member_id, s.total_days, s.tier_a_days, s.tier_b_days, s.tier_b_ratio
        FROM shift_summary s
        JOIN members m ON m.id = s.member_id
        ORDER BY s.member_id
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|(name, grade, member_id, total, a, b, ratio)| {
            let grade = u32::try_from(grade).map_err(|_| {
                Error::Internal(format!("Member {} has invalid grade {}", member_id, grade))
            })?;
            Ok(SummaryEntry {
                name,
                grade,
                record: record_from_row((member_id, total, a, b, ratio))?,
            })
        })
        .collect()
}

/// Convenience lookup for a single member's row
pub async fn summary_for<'e, E>(executor: E, member_id: MemberId) -> Result<Option<SummaryRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<SummaryRow> = sqlx::query_as(
        r#"
        SELECT member_id, total_days, tier_a_days, tier_b_days, tier_b_ratio
        FROM shift_summary
        WHERE member_id = ?
        "#,
    )
    .bind(member_id)
    .fetch_optional(executor)
    .await?;

    row.map(record_from_row).transpose()
}
