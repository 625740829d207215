//! Daily fairness selection
//!
//! Picks one day's crew from the available pool:
//!
//! 1. Draw the required headcount from the date's regime range.
//! 2. Drop pool entries that are not on the active roster.
//! 3. If leadership positions are configured, seat the least-worked
//!    available leader first.
//! 4. Fill the remaining slots one at a time with the candidate minimizing
//!    `(season workload, today's count of the candidate's grade)`. Equal
//!    scores keep pool order.
//! 5. Add one day to the workload of everyone selected.
//!
//! Understaffing is accepted as-is and reported, never an error.

use crate::calendar::{regime_for, Regime};
use crate::config::StaffingRequirements;
use crate::models::{Member, MemberId};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Days assigned so far this season, per active member
///
/// Counts only ever grow, by exactly one per assigned day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadCounter {
    counts: BTreeMap<MemberId, u32>,
}

impl WorkloadCounter {
    /// Zero counter for every given member
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = MemberId>,
    {
        Self {
            counts: members.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    pub fn is_tracked(&self, member_id: MemberId) -> bool {
        self.counts.contains_key(&member_id)
    }

    /// Current count; 0 for untracked members
    pub fn get(&self, member_id: MemberId) -> u32 {
        self.counts.get(&member_id).copied().unwrap_or(0)
    }

    pub(crate) fn increment(&mut self, member_id: MemberId) {
        if let Some(count) = self.counts.get_mut(&member_id) {
            *count += 1;
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// (member, count) pairs in member id order
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, u32)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Non-fatal condition observed while staffing a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Leadership guarantee is on but no leader was available
    NoLeaderAvailable { date: NaiveDate },
    /// Fewer members were available than the drawn headcount
    Understaffed {
        date: NaiveDate,
        required: u32,
        assigned: u32,
    },
    /// Availability referenced a member that is not on the active roster
    UnknownMember { date: NaiveDate, member_id: MemberId },
}

impl Anomaly {
    pub fn date(&self) -> NaiveDate {
        match self {
            Anomaly::NoLeaderAvailable { date }
            | Anomaly::Understaffed { date, .. }
            | Anomaly::UnknownMember { date, .. } => *date,
        }
    }
}

/// Result of staffing one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOutcome {
    pub date: NaiveDate,
    pub regime: Regime,
    /// Headcount drawn for the day
    pub required: u32,
    /// Selected members, guaranteed leader first
    pub assigned: Vec<MemberId>,
    /// The leader seated by the leadership guarantee, if any
    pub leader: Option<MemberId>,
    pub anomalies: Vec<Anomaly>,
}

/// Static per-member attributes the selector consults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Profile {
    grade: u32,
    is_leader: bool,
}

/// Daily fairness selector
///
/// Holds the roster's static attributes and the staffing settings; the
/// workload counter is passed in by the caller for each day.
#[derive(Debug, Clone)]
pub struct DailySelector {
    profiles: HashMap<MemberId, Profile>,
    staffing: StaffingRequirements,
    leadership_enabled: bool,
    shuffle_candidates: bool,
}

impl DailySelector {
    /// Build a selector for the active members of `roster`
    ///
    /// An empty `leadership_positions` disables the leadership guarantee.
    pub fn new(
        roster: &[Member],
        leadership_positions: &[String],
        staffing: StaffingRequirements,
    ) -> Self {
        let profiles = roster
            .iter()
            .filter(|m| m.is_active)
            .map(|m| {
                (
                    m.id,
                    Profile {
                        grade: m.grade,
                        is_leader: m.holds_position_in(leadership_positions),
                    },
                )
            })
            .collect();

        Self {
            profiles,
            staffing,
            leadership_enabled: !leadership_positions.is_empty(),
            shuffle_candidates: false,
        }
    }

    /// Shuffle each day's pool before selection
    pub fn with_shuffle(mut self, shuffle_candidates: bool) -> Self {
        self.shuffle_candidates = shuffle_candidates;
        self
    }

    /// Staff `date` from `available`, then bump `workload` for the crew
    pub fn select<R: Rng + ?Sized>(
        &self,
        date: NaiveDate,
        available: &[MemberId],
        workload: &mut WorkloadCounter,
        rng: &mut R,
    ) -> DayOutcome {
        let regime = regime_for(date);
        let required = self.staffing.for_regime(regime).draw(rng);
        let mut anomalies = Vec::new();

        let mut seen = HashSet::new();
        let mut pool: Vec<MemberId> = Vec::with_capacity(available.len());
        for &member_id in available {
            if !seen.insert(member_id) {
                continue;
            }
            if workload.is_tracked(member_id) && self.profiles.contains_key(&member_id) {
                pool.push(member_id);
            } else {
                debug!("{}: ignoring availability of unknown member {}", date, member_id);
                anomalies.push(Anomaly::UnknownMember { date, member_id });
            }
        }

        if self.shuffle_candidates {
            pool.shuffle(rng);
        }

        let mut assigned: Vec<MemberId> = Vec::with_capacity(required as usize);
        let mut grade_tally: HashMap<u32, u32> = HashMap::new();
        let mut leader = None;

        if self.leadership_enabled && required > 0 {
            let best_leader = pool
                .iter()
                .enumerate()
                .filter(|(_, id)| self.profile(**id).is_leader)
                .min_by_key(|(_, id)| workload.get(**id))
                .map(|(index, _)| index);

            match best_leader {
                Some(index) => {
                    let member_id = pool.remove(index);
                    *grade_tally.entry(self.profile(member_id).grade).or_insert(0) += 1;
                    assigned.push(member_id);
                    leader = Some(member_id);
                }
                None => {
                    warn!("{}: no leader available", date);
                    anomalies.push(Anomaly::NoLeaderAvailable { date });
                }
            }
        }

        while (assigned.len() as u32) < required && !pool.is_empty() {
            let best = pool
                .iter()
                .enumerate()
                .min_by_key(|(_, id)| {
                    let grade = self.profile(**id).grade;
                    (workload.get(**id), grade_tally.get(&grade).copied().unwrap_or(0))
                })
                .map(|(index, _)| index);

            let Some(index) = best else { break };
            let member_id = pool.remove(index);
            *grade_tally.entry(self.profile(member_id).grade).or_insert(0) += 1;
            assigned.push(member_id);
        }

        if (assigned.len() as u32) < required {
            warn!(
                "{}: understaffed, {} of {} required",
                date,
                assigned.len(),
                required
            );
            anomalies.push(Anomaly::Understaffed {
                date,
                required,
                assigned: assigned.len() as u32,
            });
        }

        for &member_id in &assigned {
            workload.increment(member_id);
        }

        debug!(
            "{} ({}): assigned {} of {} required",
            date,
            regime.as_str(),
            assigned.len(),
            required
        );

        DayOutcome {
            date,
            regime,
            required,
            assigned,
            leader,
            anomalies,
        }
    }

    fn profile(&self, member_id: MemberId) -> Profile {
        self.profiles.get(&member_id).copied().unwrap_or(Profile {
            grade: 0,
            is_leader: false,
        })
    }
}
