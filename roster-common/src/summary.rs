//! Workload summary aggregation
//!
//! Derived only from assignment records, so it can be recomputed from the
//! persisted shift table at any time (including after manual edits).

use crate::models::{Member, MemberId, PaymentTier, ShiftAssignment, SummaryRecord};
use std::collections::HashMap;
use tracing::debug;

/// Tier B share of `total_days` as a percentage; 0 when nothing was worked
pub fn tier_b_ratio_percent(tier_b_days: u32, total_days: u32) -> f64 {
    if total_days == 0 {
        0.0
    } else {
        tier_b_days as f64 / total_days as f64 * 100.0
    }
}

/// One summary row per active member, in roster order
///
/// Active members without assignments get a zero-filled row. Records of
/// members who are no longer active are left out.
pub fn aggregate_summary(roster: &[Member], assignments: &[ShiftAssignment]) -> Vec<SummaryRecord> {
    let mut tallies: HashMap<MemberId, (u32, u32)> = HashMap::new();
    for record in assignments {
        let (tier_a, tier_b) = tallies.entry(record.member_id).or_insert((0, 0));
        match record.tier {
            PaymentTier::TierA => *tier_a += 1,
            PaymentTier::TierB => *tier_b += 1,
        }
    }

    let summary: Vec<SummaryRecord> = roster
        .iter()
        .filter(|m| m.is_active)
        .map(|m| match tallies.get(&m.id) {
            Some(&(tier_a_days, tier_b_days)) => {
                let total_days = tier_a_days + tier_b_days;
                SummaryRecord {
                    member_id: m.id,
                    total_days,
                    tier_a_days,
                    tier_b_days,
                    tier_b_ratio_percent: tier_b_ratio_percent(tier_b_days, total_days),
                }
            }
            None => SummaryRecord::empty(m.id),
        })
        .collect();

    let skipped = tallies
        .keys()
        .filter(|id| !roster.iter().any(|m| m.is_active && m.id == **id))
        .count();
    if skipped > 0 {
        debug!("Summary skipped records of {} inactive members", skipped);
    }

    summary
}
