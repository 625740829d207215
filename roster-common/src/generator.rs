//! Shift generation service
//!
//! Loads the roster, runs the season and payment passes in memory, then
//! publishes the result in a single transaction. A failure anywhere leaves
//! the previously published schedule untouched.

use crate::availability::AvailabilityIndex;
use crate::calendar::Regime;
use crate::config::RosterConfig;
use crate::db::availability::list_availability;
use crate::db::members::list_active_members;
use crate::db::runs::{record_run, RunRecord};
use crate::db::shifts::replace_shifts;
use crate::db::summary::recompute_summary;
use crate::models::{MemberId, SummaryRecord};
use crate::payment::partition_payment_tiers;
use crate::season::run_season;
use crate::selector::Anomaly;
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Staffing result of one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub regime: Regime,
    pub required: u32,
    pub assigned: u32,
    pub leader: Option<MemberId>,
}

/// What a generation run published
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub days: Vec<DaySummary>,
    pub assignment_count: u32,
    pub anomalies: Vec<Anomaly>,
    pub summary: Vec<SummaryRecord>,
}

impl GenerationReport {
    pub fn understaffed_days(&self) -> usize {
        self.days.iter().filter(|d| d.assigned < d.required).count()
    }
}

/// Generates and publishes the season schedule
///
/// Cloning is cheap; clones share the pool and the run lock, so at most
/// one generation or summary refresh writes at a time.
#[derive(Clone)]
pub struct ShiftGenerator {
    pool: SqlitePool,
    config: Arc<RosterConfig>,
    run_lock: Arc<Mutex<()>>,
}

impl ShiftGenerator {
    pub fn new(pool: SqlitePool, config: RosterConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Regenerate the whole season and replace the published schedule
    pub async fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GenerationReport> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        let roster = list_active_members(&self.pool).await?;
        if roster.is_empty() {
            warn!("Generation aborted: no active members");
            return Err(Error::EmptyRoster);
        }
        let availability = AvailabilityIndex::new(list_availability(&self.pool).await?);
        info!(
            "Generation {} started: {} members, {} declarations",
            run_id,
            roster.len(),
            availability.len()
        );

        let plan = run_season(&roster, &availability, &self.config, rng)?;
        let assignments =
            partition_payment_tiers(&plan, self.config.payment.tier_a_ratio, rng);
        let anomalies: Vec<Anomaly> = plan.anomalies().cloned().collect();
        let assignment_count = u32::try_from(assignments.len())
            .map_err(|_| Error::Internal("Assignment count overflow".to_string()))?;

        let mut tx = self.pool.begin().await?;
        replace_shifts(&mut tx, &assignments).await?;
        let summary = recompute_summary(&mut tx).await?;
        record_run(
            &mut tx,
            &RunRecord {
                run_id,
                started_at,
                finished_at: Utc::now(),
                season_start: self.config.season.start,
                season_end: self.config.season.end,
                assignment_count,
                anomaly_count: anomalies.len() as u32,
            },
        )
        .await?;
        tx.commit().await?;

        let days = plan
            .days
            .iter()
            .map(|day| DaySummary {
                date: day.date,
                regime: day.regime,
                required: day.required,
                assigned: day.assigned.len() as u32,
                leader: day.leader,
            })
            .collect();

        info!(
            "Generation {} published {} assignments ({} anomalies)",
            run_id,
            assignment_count,
            anomalies.len()
        );

        Ok(GenerationReport {
            run_id,
            days,
            assignment_count,
            anomalies,
            summary,
        })
    }

    /// Rebuild the summary from the shifts currently stored
    pub async fn refresh_summary(&self) -> Result<Vec<SummaryRecord>> {
        let _guard = self.run_lock.lock().await;

        let mut tx = self.pool.begin().await?;
        let summary = recompute_summary(&mut tx).await?;
        tx.commit().await?;

        Ok(summary)
    }
}
