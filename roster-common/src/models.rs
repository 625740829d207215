//! Roster, availability and shift records

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database identity of a member
pub type MemberId = i64;

/// ISO 8601 calendar date format used for every persisted date column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Registered volunteer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Seniority tier, 1 = most junior
    pub grade: u32,
    /// Position label (e.g. "captain"); `None` for rank-and-file members
    pub position: Option<String>,
    pub is_active: bool,
}

impl Member {
    /// True if this member's position is one of the given leadership labels
    pub fn holds_position_in(&self, leadership_positions: &[String]) -> bool {
        match &self.position {
            Some(position) => leadership_positions.iter().any(|label| label == position),
            None => false,
        }
    }
}

/// A member's declaration for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityKind {
    FullDay,
    AmOnly,
    PmOnly,
    Unavailable,
}

impl AvailabilityKind {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityKind::FullDay => "full_day",
            AvailabilityKind::AmOnly => "am_only",
            AvailabilityKind::PmOnly => "pm_only",
            AvailabilityKind::Unavailable => "unavailable",
        }
    }

    /// Whether this declaration makes the member eligible for assignment
    pub fn is_workable(&self) -> bool {
        !matches!(self, AvailabilityKind::Unavailable)
    }
}

impl FromStr for AvailabilityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full_day" => Ok(AvailabilityKind::FullDay),
            "am_only" => Ok(AvailabilityKind::AmOnly),
            "pm_only" => Ok(AvailabilityKind::PmOnly),
            "unavailable" => Ok(AvailabilityKind::Unavailable),
            other => Err(Error::InvalidInput(format!(
                "Unknown availability type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AvailabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability declaration row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub kind: AvailabilityKind,
}

/// Kind of shift worked; only full-day shifts are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    FullDay,
}

impl ShiftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::FullDay => "full_day",
        }
    }
}

impl FromStr for ShiftKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full_day" => Ok(ShiftKind::FullDay),
            other => Err(Error::InvalidInput(format!("Unknown shift type '{}'", other))),
        }
    }
}

/// Payment classification of a worked day
///
/// Tier A is the target (majority) tier; tier B takes the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentTier {
    #[serde(rename = "tier_A")]
    TierA,
    #[serde(rename = "tier_B")]
    TierB,
}

impl PaymentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTier::TierA => "tier_A",
            PaymentTier::TierB => "tier_B",
        }
    }
}

impl FromStr for PaymentTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tier_A" => Ok(PaymentTier::TierA),
            "tier_B" => Ok(PaymentTier::TierB),
            other => Err(Error::InvalidInput(format!(
                "Unknown payment tier '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member working one date at one payment tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub shift_kind: ShiftKind,
    pub tier: PaymentTier,
}

/// Per-member workload totals derived from assignment records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub member_id: MemberId,
    pub total_days: u32,
    pub tier_a_days: u32,
    pub tier_b_days: u32,
    /// Tier B share of total days, 0–100; 0 when no days were worked
    pub tier_b_ratio_percent: f64,
}

impl SummaryRecord {
    /// Zero-filled row for a member with no assigned days
    pub fn empty(member_id: MemberId) -> Self {
        Self {
            member_id,
            total_days: 0,
            tier_a_days: 0,
            tier_b_days: 0,
            tier_b_ratio_percent: 0.0,
        }
    }
}

/// Parse a persisted ISO 8601 date column
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", value, e)))
}

/// Format a date for a persisted column
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
