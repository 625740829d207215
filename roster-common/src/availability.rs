//! Availability resolution
//!
//! Turns the flat declaration table into per-date pools of workable members.
//! At most one declaration counts per (member, date): a later declaration
//! replaces an earlier one but keeps the earlier one's position, so pool
//! order stays deterministic for a given input order.

use crate::models::{Availability, AvailabilityKind, MemberId};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Declarations grouped by date
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    by_date: HashMap<NaiveDate, Vec<(MemberId, AvailabilityKind)>>,
}

impl AvailabilityIndex {
    pub fn new<I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = Availability>,
    {
        let mut index = Self::default();
        for declaration in declarations {
            index.declare(declaration);
        }
        index
    }

    /// Record a declaration, overwriting any earlier one for the same key
    pub fn declare(&mut self, declaration: Availability) {
        let day = self.by_date.entry(declaration.date).or_default();
        match day.iter_mut().find(|(member, _)| *member == declaration.member_id) {
            Some(existing) => existing.1 = declaration.kind,
            None => day.push((declaration.member_id, declaration.kind)),
        }
    }

    /// Members whose declaration for `date` is full-day, morning or afternoon
    pub fn available_on(&self, date: NaiveDate) -> Vec<MemberId> {
        self.by_date
            .get(&date)
            .map(|day| {
                day.iter()
                    .filter(|(_, kind)| kind.is_workable())
                    .map(|(member, _)| *member)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The effective declaration of one member for one date
    pub fn declaration(&self, member_id: MemberId, date: NaiveDate) -> Option<AvailabilityKind> {
        self.by_date
            .get(&date)?
            .iter()
            .find(|(member, _)| *member == member_id)
            .map(|(_, kind)| *kind)
    }

    /// Number of distinct (member, date) declarations
    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Workable members for `date` straight from a declaration slice
pub fn available_members(date: NaiveDate, declarations: &[Availability]) -> Vec<MemberId> {
    AvailabilityIndex::new(declarations.iter().filter(|d| d.date == date).cloned())
        .available_on(date)
}
