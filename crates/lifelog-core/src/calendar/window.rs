//! Inclusive date windows.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An inclusive `[start, end]` range of civil dates.
///
/// Weeks run Sunday through Saturday; months run from the first to the last
/// day of the month. Both ends are part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Build a window, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The Sunday-to-Saturday week starting on `sunday`.
    pub(crate) fn week_from(sunday: NaiveDate) -> Self {
        debug_assert_eq!(sunday.weekday(), chrono::Weekday::Sun);
        Self {
            start: sunday,
            end: sunday + Duration::days(6),
        }
    }

    /// First-to-last day of a calendar month.
    pub fn month(month: u32, year: i32) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(ValidationError::MonthOutOfRange { month })?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or(ValidationError::MonthOutOfRange { month })?;
        Ok(Self {
            start,
            end: next - Duration::days(1),
        })
    }

    /// Whether `date` falls inside the window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether the two windows share at least one day.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Widen the window by `days` on each side.
    ///
    /// Fetches use a padded window; reports filter back to the exact one.
    pub fn padded(&self, days: i64) -> Self {
        let days = days.max(0);
        Self {
            start: self.start - Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }

    /// Exclusive end date, as calendar APIs expect for all-day ranges.
    pub fn exclusive_end(&self) -> NaiveDate {
        self.end + Duration::days(1)
    }

    /// Iterate every date in the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.num_days()).map(move |offset| start + Duration::days(offset))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        let err = TimeWindow::new(date(2024, 3, 9), date(2024, 3, 3)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidWindow { .. }));
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let window = TimeWindow::new(date(2024, 3, 3), date(2024, 3, 9)).unwrap();
        assert!(window.contains(date(2024, 3, 3)));
        assert!(window.contains(date(2024, 3, 9)));
        assert!(!window.contains(date(2024, 3, 2)));
        assert!(!window.contains(date(2024, 3, 10)));
    }

    #[test]
    fn month_handles_leap_february_and_december() {
        let feb = TimeWindow::month(2, 2024).unwrap();
        assert_eq!(feb.end, date(2024, 2, 29));
        let dec = TimeWindow::month(12, 2023).unwrap();
        assert_eq!(dec.start, date(2023, 12, 1));
        assert_eq!(dec.end, date(2023, 12, 31));
        assert!(TimeWindow::month(13, 2024).is_err());
        assert!(TimeWindow::month(0, 2024).is_err());
    }

    #[test]
    fn padded_and_exclusive_end() {
        let window = TimeWindow::new(date(2024, 3, 3), date(2024, 3, 9)).unwrap();
        let padded = window.padded(1);
        assert_eq!(padded.start, date(2024, 3, 2));
        assert_eq!(padded.end, date(2024, 3, 10));
        assert_eq!(window.exclusive_end(), date(2024, 3, 10));
        assert_eq!(window.padded(-3), window);

        let day = TimeWindow::single_day(date(2024, 3, 5)).padded(1);
        assert_eq!(day, TimeWindow::new(date(2024, 3, 4), date(2024, 3, 6)).unwrap());
    }

    #[test]
    fn days_iterates_whole_window() {
        let window = TimeWindow::new(date(2023, 12, 31), date(2024, 1, 2)).unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![date(2023, 12, 31), date(2024, 1, 1), date(2024, 1, 2)]);
        assert_eq!(window.num_days(), 3);
    }
}
