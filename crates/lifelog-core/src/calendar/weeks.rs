//! Sunday-anchored week numbering.
//!
//! Week 1 of a year is the Sunday-to-Saturday week that contains January 1,
//! even when most of that week falls in the previous year. Week N starts
//! `(N - 1) * 7` days after week 1's Sunday. This is not ISO-8601 numbering.

use chrono::{Datelike, Duration, NaiveDate};

use super::window::TimeWindow;
use crate::error::ValidationError;

/// Highest week number a year can produce.
pub const MAX_WEEK: u32 = 53;

/// A date before week 1 of the context year is looked up in the year before,
/// and never further back than that.
const MAX_YEAR_FALLBACKS: u8 = 1;

/// The Sunday on or before `date`.
pub fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = i64::from(date.weekday().num_days_from_sunday());
    date - Duration::days(back)
}

/// Sunday that starts week 1 of `year`.
pub fn week_one_sunday(year: i32) -> Result<NaiveDate, ValidationError> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        ValidationError::InvalidValue {
            field: "year".to_string(),
            message: format!("{year} is outside the supported calendar range"),
        }
    })?;
    Ok(sunday_on_or_before(jan_first))
}

/// Window for week `week_number` of `year`.
///
/// # Errors
///
/// Returns [`ValidationError::WeekOutOfRange`] when `week_number` is not in
/// `1..=53`.
pub fn week_window(week_number: u32, year: i32) -> Result<TimeWindow, ValidationError> {
    if !(1..=MAX_WEEK).contains(&week_number) {
        return Err(ValidationError::WeekOutOfRange { week: week_number });
    }
    let sunday = week_one_sunday(year)? + Duration::weeks(i64::from(week_number) - 1);
    Ok(TimeWindow::week_from(sunday))
}

/// Week number of `date`, counted from week 1 of `context_year`.
///
/// Dates that fall before week 1 of the context year belong to the last
/// week of the previous year. Results above 53 are clamped to 53.
///
/// # Errors
///
/// Returns [`ValidationError::DateBeforeContext`] when `date` precedes week 1
/// of both `context_year` and `context_year - 1`.
pub fn week_number_of(date: NaiveDate, context_year: i32) -> Result<u32, ValidationError> {
    resolve_week_number(date, context_year, context_year, MAX_YEAR_FALLBACKS)
}

fn resolve_week_number(
    date: NaiveDate,
    original_year: i32,
    year: i32,
    fallbacks_left: u8,
) -> Result<u32, ValidationError> {
    let elapsed = (date - week_one_sunday(year)?).num_days();
    let week = elapsed.div_euclid(7) + 1;
    if week >= 1 {
        return Ok(week.min(i64::from(MAX_WEEK)) as u32);
    }
    if fallbacks_left == 0 {
        return Err(ValidationError::DateBeforeContext {
            date,
            context_year: original_year,
        });
    }
    debug_assert!(original_year - year < i32::from(MAX_YEAR_FALLBACKS));
    resolve_week_number(date, original_year, year - 1, fallbacks_left - 1)
}

/// Every Sunday-to-Saturday week that overlaps `month` of `year`.
///
/// The first week may start in the previous month and the last may end in
/// the next one, matching how month views group weeks. This is computed
/// from civil dates alone; when week records exist in the destination store
/// their relation is authoritative (see `recap::MonthWeekResolver`).
pub fn month_to_weeks(month: u32, year: i32) -> Result<Vec<TimeWindow>, ValidationError> {
    let month_window = TimeWindow::month(month, year)?;
    let mut weeks = Vec::with_capacity(6);
    let mut sunday = sunday_on_or_before(month_window.start);
    while sunday <= month_window.end {
        weeks.push(TimeWindow::week_from(sunday));
        sunday += Duration::weeks(1);
    }
    Ok(weeks)
}
