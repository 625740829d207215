//! Availability declaration queries

use crate::models::{format_date, parse_date, Availability, AvailabilityKind, MemberId};
use crate::Result;
use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

const UPSERT_SQL: &str = r#"
    INSERT INTO availability (member_id, shift_date, availability_type)
    VALUES (?, ?, ?)
    ON CONFLICT(member_id, shift_date)
    DO UPDATE SET availability_type = excluded.availability_type
"#;

/// Record (or replace) a member's declaration for one date
pub async fn declare_availability(
    pool: &SqlitePool,
    member_id: MemberId,
    date: NaiveDate,
    kind: AvailabilityKind,
) -> Result<()> {
    sqlx::query(UPSERT_SQL)
        .bind(member_id)
        .bind(format_date(date))
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    debug!("Member {} declared {} on {}", member_id, kind, date);
    Ok(())
}

/// Upsert many declarations on one connection (usually inside a transaction)
pub async fn declare_availability_batch(
    conn: &mut SqliteConnection,
    declarations: &[Availability],
) -> Result<()> {
    for declaration in declarations {
        sqlx::query(UPSERT_SQL)
            .bind(declaration.member_id)
            .bind(format_date(declaration.date))
            .bind(declaration.kind.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Every declaration in insertion order
///
/// Rows with an unreadable date or type are logged and skipped.
pub async fn list_availability<'e, E>(executor: E) -> Result<Vec<Availability>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT member_id, shift_date, availability_type FROM availability ORDER BY id",
    )
    .fetch_all(executor)
    .await?;

    let mut declarations = Vec::with_capacity(rows.len());
    for (member_id, date, kind) in rows {
        match (parse_date(&date), kind.parse::<AvailabilityKind>()) {
            (Ok(date), Ok(kind)) => declarations.push(Availability {
                member_id,
                date,
                kind,
            }),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping availability row for member {}: {}", member_id, e);
            }
        }
    }
    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::db::members::add_member;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_declaration() {
        let pool = init_memory_database().await.unwrap();
        let id = add_member(&pool, "Sato", 2, None).await.unwrap();

        declare_availability(&pool, id, date(1), AvailabilityKind::FullDay)
            .await
            .unwrap();
        declare_availability(&pool, id, date(2), AvailabilityKind::AmOnly)
            .await
            .unwrap();
        declare_availability(&pool, id, date(1), AvailabilityKind::Unavailable)
            .await
            .unwrap();

        let declarations = list_availability(&pool).await.unwrap();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].date, date(1));
        assert_eq!(declarations[0].kind, AvailabilityKind::Unavailable);
        assert_eq!(declarations[1].kind, AvailabilityKind::AmOnly);
    }

    #[tokio::test]
    async fn test_unknown_member_rejected() {
        let pool = init_memory_database().await.unwrap();
        let result = declare_availability(&pool, 42, date(1), AvailabilityKind::FullDay).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bad_rows_skipped() {
        let pool = init_memory_database().await.unwrap();
        let id = add_member(&pool, "Sato", 2, None).await.unwrap();
        declare_availability(&pool, id, date(3), AvailabilityKind::PmOnly)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO availability (member_id, shift_date, availability_type) VALUES (?, '2025-07-04', 'evening')",
        )
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

        let declarations = list_availability(&pool).await.unwrap();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].kind, AvailabilityKind::PmOnly);
    }
}
