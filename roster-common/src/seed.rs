//! Demo roster and availability
//!
//! Replaces the member and availability tables with a ten-person roster and
//! a random declaration for every member on every season date. Published
//! shifts and the summary are cleared too, since they would reference the
//! old roster.

use crate::config::SeasonWindow;
use crate::db::availability::declare_availability_batch;
use crate::models::{Availability, AvailabilityKind};
use crate::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

/// Demo members: (name, grade, position)
pub const DEMO_MEMBERS: [(&str, u32, Option<&str>); 10] = [
    ("Daiki Sato", 4, Some("captain")),
    ("Haruka Suzuki", 4, Some("vice_captain")),
    ("Ren Takahashi", 3, None),
    ("Yui Tanaka", 3, None),
    ("Sota Watanabe", 2, None),
    ("Mio Ito", 2, None),
    ("Kaito Yamamoto", 2, None),
    ("Aoi Nakamura", 1, None),
    ("Riku Kobayashi", 1, None),
    ("Hina Kato", 1, None),
];

/// Declaration kinds and their relative weights
pub const DECLARATION_WEIGHTS: [(AvailabilityKind, u32); 4] = [
    (AvailabilityKind::FullDay, 50),
    (AvailabilityKind::AmOnly, 10),
    (AvailabilityKind::PmOnly, 10),
    (AvailabilityKind::Unavailable, 30),
];

/// Counts of what [`seed_demo_data`] wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStats {
    pub members: usize,
    pub declarations: usize,
}

/// Draw one declaration per member per season date
pub fn random_declarations<R: Rng + ?Sized>(
    member_ids: &[i64],
    season: &SeasonWindow,
    rng: &mut R,
) -> Result<Vec<Availability>> {
    let weights = WeightedIndex::new(DECLARATION_WEIGHTS.iter().map(|(_, w)| *w))
        .map_err(|e| Error::Internal(format!("Invalid declaration weights: {}", e)))?;

    let mut declarations = Vec::with_capacity(member_ids.len() * season.len());
    for &member_id in member_ids {
        for date in season.dates() {
            let (kind, _) = DECLARATION_WEIGHTS[weights.sample(rng)];
            declarations.push(Availability {
                member_id,
                date,
                kind,
            });
        }
    }
    Ok(declarations)
}

/// Wipe roster data and insert the demo roster with random availability
pub async fn seed_demo_data<R: Rng + ?Sized>(
    pool: &SqlitePool,
    season: &SeasonWindow,
    rng: &mut R,
) -> Result<SeedStats> {
    let mut tx = pool.begin().await?;

    for table in ["shift_summary", "shifts", "availability", "members"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('members', 'availability', 'shifts')")
        .execute(&mut *tx)
        .await?;

    let mut member_ids = Vec::with_capacity(DEMO_MEMBERS.len());
    for (name, grade, position) in DEMO_MEMBERS {
        let id = sqlx::query(
            "INSERT INTO members (name, grade, position, is_active) VALUES (?, ?, ?, 1)",
        )
        .bind(name)
        .bind(grade as i64)
        .bind(position)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        member_ids.push(id);
    }

    let declarations = random_declarations(&member_ids, season, rng)?;
    declare_availability_batch(&mut tx, &declarations).await?;

    tx.commit().await?;

    info!(
        "Seeded {} members with {} declarations ({} to {})",
        member_ids.len(),
        declarations.len(),
        season.start,
        season.end
    );
    Ok(SeedStats {
        members: member_ids.len(),
        declarations: declarations.len(),
    })
}
