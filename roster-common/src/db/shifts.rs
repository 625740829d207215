//! Shift assignment queries

use crate::models::{format_date, parse_date, MemberId, PaymentTier, ShiftAssignment, ShiftKind};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::debug;

/// Schedule line: one member working one date, with their name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub member_id: MemberId,
    pub name: String,
    pub tier: PaymentTier,
}

/// Replace the whole shift table with `assignments`
///
/// Meant to run inside a transaction so readers never see a partial season.
pub async fn replace_shifts(
    conn: &mut SqliteConnection,
    assignments: &[ShiftAssignment],
) -> Result<()> {
    let removed = sqlx::query("DELETE FROM shifts")
        .execute(&mut *conn)
        .await?
        .rows_affected();

    for record in assignments {
        sqlx::query(
            "INSERT INTO shifts (member_id, shift_date, shift_type, payment_type) VALUES (?, ?, ?, ?)",
        )
        .bind(record.member_id)
        .bind(format_date(record.date))
        .bind(record.shift_kind.as_str())
        .bind(record.tier.as_str())
        .execute(&mut *conn)
        .await?;
    }

    debug!(
        "Replaced {} shift rows with {}",
        removed,
        assignments.len()
    );
    Ok(())
}

/// Every persisted assignment, ordered by date then member
pub async fn load_shifts<'e, E>(executor: E) -> Result<Vec<ShiftAssignment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
        "SELECT member_id, shift_date, shift_type, payment_type FROM shifts ORDER BY shift_date, member_id",
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|(member_id, date, shift_type, payment_type)| {
            Ok(ShiftAssignment {
                member_id,
                date: parse_date(&date)?,
                shift_kind: shift_type.parse::<ShiftKind>()?,
                tier: payment_type.parse::<PaymentTier>()?,
            })
        })
        .collect()
}

/// Published schedule, ordered by date then member name
pub async fn load_schedule<'e, E>(executor: E) -> Result<Vec<ScheduleEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, i64, String, String)> = sqlx::query_as(
        r#"
        SELECT s.shift_date, s.member_id, m.name, s.payment_type
        FROM shifts s
        JOIN members m ON m.id = s.member_id
        ORDER BY s.shift_date, m.name
        "#,
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|(date, member_id, name, payment_type)| {
            Ok(ScheduleEntry {
                date: parse_date(&date)?,
                member_id,
                name,
                tier: payment_type.parse::<PaymentTier>()?,
            })
        })
        .collect()
}
