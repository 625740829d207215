//! Season driver
//!
//! Walks the season one date at a time, in order, threading a single
//! [`WorkloadCounter`] through the daily selections. Each day depends on
//! the counts left by every earlier day, so the walk is strictly sequential.

use crate::availability::AvailabilityIndex;
use crate::config::RosterConfig;
use crate::models::{Member, MemberId};
use crate::selector::{Anomaly, DailySelector, DayOutcome, WorkloadCounter};
use crate::{Error, Result};
use chrono::NaiveDate;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// In-memory result of one season run
#[derive(Debug, Clone)]
pub struct SeasonPlan {
    /// One outcome per season date, chronological
    pub days: Vec<DayOutcome>,
    /// Final workload per active member
    pub workload: WorkloadCounter,
}

impl SeasonPlan {
    /// Date → assigned members
    pub fn assignments_by_date(&self) -> BTreeMap<NaiveDate, Vec<MemberId>> {
        self.days
            .iter()
            .map(|day| (day.date, day.assigned.clone()))
            .collect()
    }

    /// Dates on which `member_id` works, chronological
    pub fn work_dates(&self, member_id: MemberId) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|day| day.assigned.contains(&member_id))
            .map(|day| day.date)
            .collect()
    }

    /// Every anomaly of the season, in date order
    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.days.iter().flat_map(|day| day.anomalies.iter())
    }

    /// Total number of (member, date) assignments
    pub fn assignment_count(&self) -> usize {
        self.days.iter().map(|day| day.assigned.len()).sum()
    }
}

/// Run the daily selector over every date of the configured season
///
/// Only active members are scheduled. Fails with [`Error::Config`] for
/// settings that cannot be honored and with [`Error::EmptyRoster`] if there
/// are no active members, both before doing any work.
///
/// Stale availability of a member not on the active roster is reported
/// once per season, on the first date it is seen.
pub fn run_season<R: Rng + ?Sized>(
    roster: &[Member],
    availability: &AvailabilityIndex,
    config: &RosterConfig,
    rng: &mut R,
) -> Result<SeasonPlan> {
    config.validate()?;

    let active: Vec<Member> = roster.iter().filter(|m| m.is_active).cloned().collect();
    if active.is_empty() {
        return Err(Error::EmptyRoster);
    }

    let selector = DailySelector::new(&active, &config.leadership_positions, config.staffing)
        .with_shuffle(config.shuffle_candidates);
    let mut workload = WorkloadCounter::new(active.iter().map(|m| m.id));
    let mut days = Vec::with_capacity(config.season.len());
    let mut stale_reported: HashSet<MemberId> = HashSet::new();

    info!(
        "Assigning shifts for {} members, {} to {}",
        active.len(),
        config.season.start,
        config.season.end
    );

    for date in config.season.dates() {
        let available = availability.available_on(date);
        let mut outcome = selector.select(date, &available, &mut workload, rng);
        outcome.anomalies.retain(|anomaly| match anomaly {
            Anomaly::UnknownMember { member_id, .. } => stale_reported.insert(*member_id),
            _ => true,
        });
        days.push(outcome);
    }

    let plan = SeasonPlan { days, workload };
    info!(
        "Season assignment complete: {} days, {} assignments, {} anomalies",
        plan.days.len(),
        plan.assignment_count(),
        plan.anomalies().count()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeasonWindow, StaffRange, StaffingRequirements};
    use crate::models::{Availability, AvailabilityKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn member(id: MemberId, grade: u32, position: Option<&str>) -> Member {
        Member {
            id,
            name: format!("member-{}", id),
            grade,
            position: position.map(str::to_string),
            is_active: true,
        }
    }

    fn config(start: NaiveDate, end: NaiveDate, weekday: StaffRange) -> RosterConfig {
        RosterConfig {
            season: SeasonWindow { start, end },
            staffing: StaffingRequirements {
                weekday,
                holiday: StaffRange::new(3, 5),
            },
            ..RosterConfig::default()
        }
    }

    fn everyone_every_day(roster: &[Member], season: SeasonWindow) -> AvailabilityIndex {
        AvailabilityIndex::new(season.dates().flat_map(|date| {
            roster.iter().map(move |m| Availability {
                member_id: m.id,
                date,
                kind: AvailabilityKind::FullDay,
            })
        }))
    }

    #[test]
    fn test_three_weekdays_two_per_day() {
        // 2025-07-01..03 are Tuesday to Thursday
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let config = config(start, end, StaffRange::new(2, 2));
        let roster: Vec<_> = (1..=10).map(|id| member(id, 1, None)).collect();
        let availability = everyone_every_day(&roster, config.season);

        let plan = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(plan.days.len(), 3);
        for day in &plan.days {
            let unique: HashSet<_> = day.assigned.iter().collect();
            assert_eq!(unique.len(), 2);
        }
        assert_eq!(plan.workload.total(), 6);
        // Least-worked rotation: nobody works twice while others are idle
        assert!(plan.workload.iter().all(|(_, count)| count <= 1));
    }

    #[test]
    fn test_workload_matches_assignment_lists() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        let mut config = config(start, end, StaffRange::new(2, 4));
        config.shuffle_candidates = true;
        config.leadership_positions = vec!["captain".to_string()];
        let roster: Vec<_> = (1..=12)
            .map(|id| member(id, (id % 4 + 1) as u32, (id <= 2).then_some("captain")))
            .collect();

        // Member 12 never declares anything
        let declared: Vec<_> = roster.iter().filter(|m| m.id != 12).cloned().collect();
        let availability = everyone_every_day(&declared, config.season);

        let plan = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(9))
            .unwrap();

        assert_eq!(plan.days.len(), config.season.len());
        for (member_id, count) in plan.workload.iter() {
            assert_eq!(plan.work_dates(member_id).len() as u32, count);
        }
        assert_eq!(plan.workload.get(12), 0);
        assert_eq!(plan.workload.total() as usize, plan.assignment_count());

        for day in &plan.days {
            let range = config.staffing.for_regime(day.regime);
            assert!(day.assigned.len() as u32 <= range.max);
            assert!(day.assigned.len() as u32 <= day.required);
            let first = day.assigned[0];
            assert!(first == 1 || first == 2, "{} led by {}", day.date, first);
        }
    }

    #[test]
    fn test_dates_processed_in_order() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        let config = config(start, end, StaffRange::new(1, 1));
        let roster = vec![member(1, 1, None)];
        let availability = AvailabilityIndex::default();

        let plan = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let dates: Vec<_> = plan.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, config.season.dates().collect::<Vec<_>>());
        assert!(plan.days.iter().all(|d| d.assigned.is_empty()));
        assert_eq!(plan.anomalies().count(), plan.days.len());
    }

    #[test]
    fn test_empty_roster_fails_fast() {
        let config = RosterConfig::default();
        let result = run_season(
            &[],
            &AvailabilityIndex::default(),
            &config,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(Error::EmptyRoster)));
    }

    #[test]
    fn test_inactive_members_never_scheduled() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let config = config(start, start, StaffRange::new(3, 3));
        let mut retired = member(2, 1, None);
        retired.is_active = false;
        let roster = vec![member(1, 1, None), retired, member(3, 1, None)];
        let availability = everyone_every_day(&roster, config.season);

        let plan = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert_eq!(plan.days[0].assigned, vec![1, 3]);
        assert!(!plan.workload.is_tracked(2));
        assert!(plan
            .anomalies()
            .any(|a| matches!(a, Anomaly::UnknownMember { member_id: 2, .. })));
    }

    #[test]
    fn test_stale_member_reported_once_per_season() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let config = config(start, end, StaffRange::new(1, 1));
        let mut retired = member(2, 1, None);
        retired.is_active = false;
        let roster = vec![member(1, 1, None), retired];
        let availability = everyone_every_day(&roster, config.season);

        let plan = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(6))
            .unwrap();

        let stale: Vec<_> = plan
            .anomalies()
            .filter(|a| matches!(a, Anomaly::UnknownMember { .. }))
            .collect();
        assert_eq!(
            stale,
            vec![&Anomaly::UnknownMember {
                date: start,
                member_id: 2
            }]
        );
        assert_eq!(plan.workload.get(1), 10);
    }

    #[test]
    fn test_inverted_staff_range_is_config_error() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let config = config(start, start, StaffRange::new(5, 2));
        let roster = vec![member(1, 1, None)];
        let availability = everyone_every_day(&roster, config.season);

        let result = run_season(&roster, &availability, &config, &mut StdRng::seed_from_u64(0));

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_all_inactive_is_empty_roster() {
        let mut retired = member(1, 1, None);
        retired.is_active = false;
        let result = run_season(
            &[retired],
            &AvailabilityIndex::default(),
            &RosterConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(Error::EmptyRoster)));
    }
}
