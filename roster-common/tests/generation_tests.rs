//! End-to-end generation against a real database file

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use roster_common::calendar::Regime;
use roster_common::config::{SeasonWindow, StaffRange, StaffingRequirements};
use roster_common::db::availability::declare_availability;
use roster_common::db::members::{add_member, deactivate_member};
use roster_common::db::runs::list_runs;
use roster_common::db::shifts::load_shifts;
use roster_common::db::summary::load_summary;
use roster_common::db::init_database;
use roster_common::models::{AvailabilityKind, MemberId, PaymentTier, SummaryRecord};
use roster_common::selector::Anomaly;
use roster_common::{Error, RosterConfig, ShiftGenerator};
use sqlx::SqlitePool;
use tempfile::TempDir;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn config(start: NaiveDate, end: NaiveDate, weekday: u32, holiday: u32) -> RosterConfig {
    RosterConfig {
        season: SeasonWindow { start, end },
        staffing: StaffingRequirements {
            weekday: StaffRange::new(weekday, weekday),
            holiday: StaffRange::new(holiday, holiday),
        },
        ..RosterConfig::default()
    }
}

async fn open() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("roster.db")).await.unwrap();
    (dir, pool)
}

/// Ten grade-1 members; all but the last declare full_day for every date
async fn populate(pool: &SqlitePool, season: &SeasonWindow) -> Vec<MemberId> {
    let mut ids = Vec::new();
    for i in 1..=10 {
        ids.push(add_member(pool, &format!("Member {:02}", i), 1, None).await.unwrap());
    }
    for &id in &ids[..9] {
        for day in season.dates() {
            declare_availability(pool, id, day, AvailabilityKind::FullDay)
                .await
                .unwrap();
        }
    }
    ids
}

#[tokio::test]
async fn test_three_weekdays_publish_six_shifts() {
    let (_dir, pool) = open().await;
    // Tuesday to Thursday
    let config = config(date(7, 1), date(7, 3), 2, 5);
    let ids = populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);

    let report = generator
        .generate(&mut StdRng::seed_from_u64(42))
        .await
        .unwrap();

    assert_eq!(report.assignment_count, 6);
    assert!(report.anomalies.is_empty());
    assert!(report.days.iter().all(|d| d.regime == Regime::Weekday));

    let stored = load_shifts(&pool).await.unwrap();
    assert_eq!(stored.len(), 6);
    for day in [date(7, 1), date(7, 2), date(7, 3)] {
        assert_eq!(stored.iter().filter(|s| s.date == day).count(), 2);
    }
    // One day each: round(0.8) = 1 tier A day
    assert!(stored.iter().all(|s| s.tier == PaymentTier::TierA));

    let summary = load_summary(&pool).await.unwrap();
    assert_eq!(summary, report.summary);
    assert_eq!(summary.len(), 10);
    assert_eq!(summary.iter().map(|r| r.total_days).sum::<u32>(), 6);
    for record in &summary {
        let worked = stored.iter().filter(|s| s.member_id == record.member_id).count();
        assert_eq!(record.total_days as usize, worked);
        assert_eq!(record.tier_a_days + record.tier_b_days, record.total_days);
    }

    let silent = summary.iter().find(|r| r.member_id == ids[9]).unwrap();
    assert_eq!(*silent, SummaryRecord::empty(ids[9]));

    let runs = list_runs(&pool).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, report.run_id);
    assert_eq!(runs[0].assignment_count, 6);
}

#[tokio::test]
async fn test_holiday_uses_holiday_staffing() {
    let (_dir, pool) = open().await;
    // Sunday 2025-07-20 and Marine Day 2025-07-21, then a plain Tuesday
    let config = config(date(7, 20), date(7, 22), 1, 4);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);

    let report = generator
        .generate(&mut StdRng::seed_from_u64(7))
        .await
        .unwrap();

    let staffed: Vec<(Regime, u32)> = report.days.iter().map(|d| (d.regime, d.assigned)).collect();
    assert_eq!(
        staffed,
        vec![(Regime::Holiday, 4), (Regime::Holiday, 4), (Regime::Weekday, 1)]
    );
}

#[tokio::test]
async fn test_regeneration_replaces_previous_schedule() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 11), 3, 6);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);

    let first = generator.generate(&mut StdRng::seed_from_u64(1)).await.unwrap();
    let second = generator.generate(&mut StdRng::seed_from_u64(2)).await.unwrap();

    let stored = load_shifts(&pool).await.unwrap();
    assert_eq!(stored.len() as u32, second.assignment_count);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(list_runs(&pool).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_same_seed_same_schedule() {
    let config = config(date(6, 27), date(7, 31), 3, 7);

    let mut schedules = Vec::new();
    for _ in 0..2 {
        let (_dir, pool) = open().await;
        populate(&pool, &config.season).await;
        let generator = ShiftGenerator::new(pool.clone(), config.clone());
        generator
            .generate(&mut StdRng::seed_from_u64(2025))
            .await
            .unwrap();
        schedules.push(load_shifts(&pool).await.unwrap());
        pool.close().await;
    }

    assert_eq!(schedules[0], schedules[1]);
}

#[tokio::test]
async fn test_understaffed_days_reported() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 2), 12, 12);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);

    let report = generator
        .generate(&mut StdRng::seed_from_u64(3))
        .await
        .unwrap();

    assert_eq!(report.understaffed_days(), 2);
    assert_eq!(report.assignment_count, 18);
    assert!(report.anomalies.iter().all(|a| matches!(
        a,
        Anomaly::Understaffed {
            required: 12,
            assigned: 9,
            ..
        }
    )));
}

#[tokio::test]
async fn test_refresh_summary_after_manual_edit() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 8), 4, 6);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);
    let report = generator
        .generate(&mut StdRng::seed_from_u64(5))
        .await
        .unwrap();

    let refreshed = generator.refresh_summary().await.unwrap();
    assert_eq!(refreshed, report.summary);
    assert_eq!(generator.refresh_summary().await.unwrap(), refreshed);

    sqlx::query("DELETE FROM shifts WHERE id = (SELECT MIN(id) FROM shifts)")
        .execute(&pool)
        .await
        .unwrap();
    let edited = generator.refresh_summary().await.unwrap();

    let before: u32 = refreshed.iter().map(|r| r.total_days).sum();
    let after: u32 = edited.iter().map(|r| r.total_days).sum();
    assert_eq!(after + 1, before);
    assert_eq!(load_summary(&pool).await.unwrap(), edited);
}

#[tokio::test]
async fn test_empty_roster_leaves_schedule_untouched() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 3), 2, 2);
    let ids = populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);
    generator
        .generate(&mut StdRng::seed_from_u64(8))
        .await
        .unwrap();
    let published = load_shifts(&pool).await.unwrap();

    for id in ids {
        deactivate_member(&pool, id).await.unwrap();
    }
    let result = generator.generate(&mut StdRng::seed_from_u64(9)).await;

    assert!(matches!(result, Err(Error::EmptyRoster)));
    assert_eq!(load_shifts(&pool).await.unwrap(), published);
    assert_eq!(list_runs(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_publish_rolls_back() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 3), 2, 2);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);
    generator
        .generate(&mut StdRng::seed_from_u64(12))
        .await
        .unwrap();
    let shifts_before = load_shifts(&pool).await.unwrap();
    let summary_before = load_summary(&pool).await.unwrap();

    // Audit insert is the last write of the transaction
    sqlx::query("DROP TABLE generation_runs")
        .execute(&pool)
        .await
        .unwrap();
    let result = generator.generate(&mut StdRng::seed_from_u64(13)).await;

    assert!(matches!(result, Err(Error::Database(_))));
    assert_eq!(load_shifts(&pool).await.unwrap(), shifts_before);
    assert_eq!(load_summary(&pool).await.unwrap(), summary_before);
}

#[tokio::test]
async fn test_concurrent_generations_serialize() {
    let (_dir, pool) = open().await;
    let config = config(date(7, 1), date(7, 15), 3, 5);
    populate(&pool, &config.season).await;
    let generator = ShiftGenerator::new(pool.clone(), config);
    let other = generator.clone();

    let (a, b) = tokio::join!(
        async move { generator.generate(&mut StdRng::seed_from_u64(10)).await },
        async move { other.generate(&mut StdRng::seed_from_u64(11)).await },
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let stored = load_shifts(&pool).await.unwrap().len() as u32;
    assert!(stored == a.assignment_count || stored == b.assignment_count);
    let summary_total: u32 = load_summary(&pool)
        .await
        .unwrap()
        .iter()
        .map(|r| r.total_days)
        .sum();
    assert_eq!(summary_total, stored);
    assert_eq!(list_runs(&pool).await.unwrap().len(), 2);
}
