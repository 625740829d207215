//! Staffing regime classification
//!
//! A date is staffed under the holiday regime when it falls on a Saturday or
//! Sunday, or is a Japanese public holiday. Public holidays are computed from
//! the rules of the National Holidays Act as amended through the 2021 Olympic
//! adjustments:
//!
//! - fixed-date holidays, with the date changes of 2007 (Showa Day) and 2019
//!   (Emperor's Birthday moved from Dec 23 to Feb 23),
//! - "Happy Monday" holidays (nth Monday of a month),
//! - vernal and autumnal equinox days from the standard approximation
//!   (valid 1980–2099),
//! - one-off 2019 enthronement holidays and the 2020/2021 Olympic moves,
//! - substitute holidays for holidays falling on a Sunday,
//! - citizens' holidays for a weekday sandwiched between two holidays.
//!
//! Years outside [`SUPPORTED_YEARS`] have no public holidays; only weekends
//! count as holidays there.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Revision of the holiday rules encoded below
pub const HOLIDAY_RULES_VERSION: &str = "jp-2021.1";

/// Years for which public holidays are computed
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 2000..=2099;

/// Staffing category of a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Weekday,
    Holiday,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Weekday => "weekday",
            Regime::Holiday => "holiday",
        }
    }
}

/// Classify a date into its staffing regime
pub fn regime_for(date: NaiveDate) -> Regime {
    if is_holiday_regime(date) {
        Regime::Holiday
    } else {
        Regime::Weekday
    }
}

/// True for Saturdays, Sundays and public holidays
pub fn is_holiday_regime(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || holiday_name(date).is_some()
}

/// Name of the public holiday on `date`, if any
pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    holidays_in_year(date.year())
        .into_iter()
        .find(|(day, _)| *day == date)
        .map(|(_, name)| name)
}

/// All public holidays of a year, sorted by date
pub fn holidays_in_year(year: i32) -> Vec<(NaiveDate, &'static str)> {
    if !SUPPORTED_YEARS.contains(&year) {
        return Vec::new();
    }

    let named = named_holidays(year);
    let is_named = |date: NaiveDate| named.iter().any(|(day, _)| *day == date);

    let mut holidays = named.clone();

    // Substitute holidays: a Sunday holiday moves to the next non-holiday.
    // Before 2007 the substitute could only be the following Monday.
    for (day, _) in named.iter().filter(|(day, _)| day.weekday() == Weekday::Sun) {
        let mut substitute = *day + Duration::days(1);
        if year >= 2007 {
            while is_named(substitute) {
                substitute += Duration::days(1);
            }
        } else if is_named(substitute) {
            continue;
        }
        if substitute.year() == year {
            holidays.push((substitute, "Substitute Holiday"));
        }
    }

    // Citizens' holidays: a non-Sunday day between two named holidays
    for (day, _) in &named {
        let candidate = *day + Duration::days(1);
        let next = candidate + Duration::days(1);
        if is_named(next)
            && !is_named(candidate)
            && candidate.weekday() != Weekday::Sun
            && !holidays.iter().any(|(d, _)| *d == candidate)
        {
            holidays.push((candidate, "Citizens' Holiday"));
        }
    }

    holidays.sort_by_key(|(day, _)| *day);
    holidays
}

fn named_holidays(year: i32) -> Vec<(NaiveDate, &'static str)> {
    let mut days: Vec<(Option<NaiveDate>, &'static str)> = vec![
        (ymd(year, 1, 1), "New Year's Day"),
        (nth_monday(year, 1, 2), "Coming of Age Day"),
        (ymd(year, 2, 11), "National Foundation Day"),
        (ymd(year, 3, vernal_equinox_day(year)), "Vernal Equinox Day"),
        (ymd(year, 5, 3), "Constitution Memorial Day"),
        (ymd(year, 5, 5), "Children's Day"),
        (ymd(year, 9, autumnal_equinox_day(year)), "Autumnal Equinox Day"),
        (ymd(year, 11, 3), "Culture Day"),
        (ymd(year, 11, 23), "Labour Thanksgiving Day"),
    ];

    if year >= 2007 {
        days.push((ymd(year, 4, 29), "Showa Day"));
        days.push((ymd(year, 5, 4), "Greenery Day"));
    } else {
        days.push((ymd(year, 4, 29), "Greenery Day"));
    }

    if year >= 2020 {
        days.push((ymd(year, 2, 23), "Emperor's Birthday"));
    } else if year <= 2018 {
        days.push((ymd(year, 12, 23), "Emperor's Birthday"));
    }

    if year == 2019 {
        days.push((ymd(year, 5, 1), "Enthronement Day"));
        days.push((ymd(year, 10, 22), "Enthronement Ceremony Day"));
    }

    let marine_day = match year {
        2020 => ymd(year, 7, 23),
        2021 => ymd(year, 7, 22),
        y if y >= 2003 => nth_monday(year, 7, 3),
        _ => ymd(year, 7, 20),
    };
    days.push((marine_day, "Marine Day"));

    let mountain_day = match year {
        2020 => ymd(year, 8, 10),
        2021 => ymd(year, 8, 8),
        y if y >= 2016 => ymd(year, 8, 11),
        _ => None,
    };
    if mountain_day.is_some() {
        days.push((mountain_day, "Mountain Day"));
    }

    let respect_for_aged = if year >= 2003 {
        nth_monday(year, 9, 3)
    } else {
        ymd(year, 9, 15)
    };
    days.push((respect_for_aged, "Respect for the Aged Day"));

    match year {
        2020 => days.push((ymd(year, 7, 24), "Sports Day")),
        2021 => days.push((ymd(year, 7, 23), "Sports Day")),
        y if y > 2020 => days.push((nth_monday(year, 10, 2), "Sports Day")),
        _ => days.push((nth_monday(year, 10, 2), "Health and Sports Day")),
    }

    let mut named: Vec<(NaiveDate, &'static str)> = days
        .into_iter()
        .filter_map(|(day, name)| day.map(|d| (d, name)))
        .collect();
    named.sort_by_key(|(day, _)| *day);
    named
}

/// Day of March of the vernal equinox (1980–2099 approximation)
fn vernal_equinox_day(year: i32) -> u32 {
    equinox_day(20.8431, year)
}

/// Day of September of the autumnal equinox (1980–2099 approximation)
fn autumnal_equinox_day(year: i32) -> u32 {
    equinox_day(23.2488, year)
}

fn equinox_day(base: f64, year: i32) -> u32 {
    let offset = year - 1980;
    (base + 0.242194 * offset as f64 - (offset / 4) as f64).floor() as u32
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn nth_monday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Mon, n)
}
