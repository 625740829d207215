//! Member roster queries

use crate::models::{Member, MemberId};
use crate::{Error, Result};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::info;

type MemberRow = (i64, String, i64, Option<String>, bool);

fn member_from_row((id, name, grade, position, is_active): MemberRow) -> Result<Member> {
    let grade = u32::try_from(grade)
        .map_err(|_| Error::InvalidInput(format!("Member {} has invalid grade {}", id, grade)))?;
    Ok(Member {
        id,
        name,
        grade,
        position,
        is_active,
    })
}

/// Register a new active member; returns the assigned id
pub async fn add_member(
    pool: &SqlitePool,
    name: &str,
    grade: u32,
    position: Option<&str>,
) -> Result<MemberId> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Member name must not be empty".to_string()));
    }
    if grade == 0 {
        return Err(Error::InvalidInput(format!(
            "Grade must be at least 1 (got {})",
            grade
        )));
    }
    let position = position.map(str::trim).filter(|p| !p.is_empty());

    let result = sqlx::query(
        "INSERT INTO members (name, grade, position, is_active) VALUES (?, ?, ?, 1)",
    )
    .bind(name)
    .bind(grade as i64)
    .bind(position)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!("Added member {} ({}, grade {})", id, name, grade);
    Ok(id)
}

/// Mark a member inactive; their history stays in place
pub async fn deactivate_member(pool: &SqlitePool, member_id: MemberId) -> Result<()> {
    let result = sqlx::query("UPDATE members SET is_active = 0 WHERE id = ?")
        .bind(member_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::InvalidInput(format!("Member {} not found", member_id)));
    }
    info!("Deactivated member {}", member_id);
    Ok(())
}

/// Active members in id order
pub async fn list_active_members<'e, E>(executor: E) -> Result<Vec<Member>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<MemberRow> = sqlx::query_as(
        "SELECT id, name, grade, position, is_active FROM members WHERE is_active = 1 ORDER BY id",
    )
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(member_from_row).collect()
}

/// Every member, active or not, in id order
pub async fn list_members<'e, E>(executor: E) -> Result<Vec<Member>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<MemberRow> =
        sqlx::query_as("SELECT id, name, grade, position, is_active FROM members ORDER BY id")
            .fetch_all(executor)
            .await?;

    rows.into_iter().map(member_from_row).collect()
}
