// Calendar utilities
//
// Date parsing, night counting, the half-open overlap predicate used by every
// conflict check, and the peak-season window with its stay-length cap.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors raised while parsing or validating calendar input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Invalid date: '{0}' (expected yyyy-MM-dd or an ISO-8601 timestamp)")]
    InvalidDate(String),

    #[error("Check-out date {check_out} must be after check-in date {check_in}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Invalid month/day '{0}' (expected MM-dd)")]
    InvalidMonthDay(String),
}

/// Parse a date from user input.
///
/// Accepts `yyyy-MM-dd`, RFC 3339 timestamps (the calendar date is taken in the
/// timestamp's own offset) and naive `yyyy-MM-ddTHH:mm:ss` timestamps. Time of
/// day is always discarded.
pub fn parse_date(input: &str) -> Result<NaiveDate, CalendarError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp.date());
        }
    }

    Err(CalendarError::InvalidDate(input.to_string()))
}

/// Number of nights between two dates; 0 when `check_out <= check_in`
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(0)
}

/// The calendar day after `date`; fails at the end of the representable range.
pub fn next_day(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    date.checked_add_signed(Duration::days(1))
        .ok_or_else(|| CalendarError::InvalidDate(format!("day after {}", date)))
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
///
/// A range ending on the day another begins does not overlap it, which is what
/// allows same-day checkout/check-in turnover.
pub fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && a_end > b_start
}

/// A validated stay: check-out is strictly after check-in and exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// The single night starting on `date`
    pub fn night_of(date: NaiveDate) -> Result<Self, CalendarError> {
        Self::new(date, next_day(date)?)
    }

    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, CalendarError> {
        if check_out <= check_in {
            return Err(CalendarError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Parse both ends from user input and validate the ordering
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, CalendarError> {
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }

    pub fn nights(&self) -> i64 {
        nights_between(self.check_in, self.check_out)
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        overlaps(self.check_in, self.check_out, other.check_in, other.check_out)
    }

    /// True when `date` is one of the nights of this stay
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    /// Every night of the stay, check-in first
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> {
        let nights = self.nights() as usize;
        self.check_in.iter_days().take(nights)
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.check_in, self.check_out)
    }
}

/// A month/day pair independent of year, e.g. `06-01`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// Build a month/day; Feb 29 is rejected so that every year has the date
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2001, month, day).map(|_| Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidMonthDay(s.to_string());
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        MonthDay::new(month, day).ok_or_else(invalid)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Annual peak window, start inclusive and end exclusive.
///
/// A window whose end precedes its start wraps the new year (e.g. `11-15` to `02-01`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl Default for PeakWindow {
    /// June 1 through August 31 (end exclusive on September 1)
    fn default() -> Self {
        Self {
            start: MonthDay { month: 6, day: 1 },
            end: MonthDay { month: 9, day: 1 },
        }
    }
}

impl PeakWindow {
    pub fn new(start: MonthDay, end: MonthDay) -> Self {
        Self { start, end }
    }

    fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// Concrete `[start, end)` bounds of the window that opens in `year`
    pub fn bounds(&self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start.in_year(year)?;
        let end_year = if self.wraps() { year + 1 } else { year };
        let end = self.end.in_year(end_year)?;
        Some((start, end))
    }

    /// Whether `date` falls inside the window that opens in `year`
    pub fn is_within_peak_window(&self, date: NaiveDate, year: i32) -> bool {
        match self.bounds(year) {
            Some((start, end)) => start <= date && date < end,
            None => false,
        }
    }

    /// Whether `date` falls inside any year's window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.is_within_peak_window(date, date.year())
            || (self.wraps() && self.is_within_peak_window(date, date.year() - 1))
    }

    /// Whether any night of the stay falls inside the window
    pub fn overlaps_stay(&self, stay: &StayRange) -> bool {
        stay.nights_iter().any(|night| self.contains(night))
    }
}

/// Peak-season stay-length rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakSeason {
    pub window: PeakWindow,
    pub max_nights: i64,
}

impl Default for PeakSeason {
    fn default() -> Self {
        Self {
            window: PeakWindow::default(),
            max_nights: 14,
        }
    }
}

impl PeakSeason {
    /// True when the stay is longer than the cap, touches the peak window and
    /// is not PCS-exempt. Stays at or under the cap are always permitted.
    pub fn exceeds_peak_stay_limit(&self, stay: &StayRange, is_pcs_exempt: bool) -> bool {
        if is_pcs_exempt || stay.nights() <= self.max_nights {
            return false;
        }
        self.window.overlaps_stay(stay)
    }
}
