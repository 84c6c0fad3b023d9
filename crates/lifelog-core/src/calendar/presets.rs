//! Named window selections ("last week", "week 12 of 2024", ...).

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::weeks::{sunday_on_or_before, week_number_of, week_window};
use super::window::TimeWindow;
use crate::error::ValidationError;

/// How a caller picked the window for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSelector {
    /// Week containing `today`.
    ThisWeek,
    /// Week before the one containing `today`.
    LastWeek,
    /// Explicit week number of a year.
    Week { week: u32, year: i32 },
    /// Explicit calendar month.
    Month { month: u32, year: i32 },
    /// Explicit inclusive range.
    Range { start: NaiveDate, end: NaiveDate },
}

/// Whether a resolved window is a week or a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week { week: u32, year: i32 },
    Month { month: u32, year: i32 },
    Custom,
}

/// A window together with the period it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWindow {
    pub window: TimeWindow,
    pub period: Period,
}

impl ResolvedWindow {
    /// Human label used as the recap record title.
    pub fn title(&self) -> String {
        match self.period {
            Period::Week { week, year } => format!("Week {week} {year}"),
            Period::Month { month, year } => {
                let name = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|d| d.format("%B").to_string())
                    .unwrap_or_else(|| format!("Month {month}"));
                format!("{name} {year}")
            }
            Period::Custom => format!("{} - {}", self.window.start, self.window.end),
        }
    }
}

impl WindowSelector {
    /// Resolve the selector relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<ResolvedWindow, ValidationError> {
        match *self {
            WindowSelector::ThisWeek => week_containing(today),
            WindowSelector::LastWeek => week_containing(today - Duration::weeks(1)),
            // Numbered from the week's own Saturday so a window has one title
            // however it was picked.
            WindowSelector::Week { week, year } => week_containing(week_window(week, year)?.start),
            WindowSelector::Month { month, year } => Ok(ResolvedWindow {
                window: TimeWindow::month(month, year)?,
                period: Period::Month { month, year },
            }),
            WindowSelector::Range { start, end } => Ok(ResolvedWindow {
                window: TimeWindow::new(start, end)?,
                period: Period::Custom,
            }),
        }
    }
}

/// Week (and its number) that contains `date`.
///
/// The year is taken from the week's Saturday so the week holding January 1
/// is week 1 of the new year rather than week 53 of the old one.
fn week_containing(date: NaiveDate) -> Result<ResolvedWindow, ValidationError> {
    let window = TimeWindow::week_from(sunday_on_or_before(date));
    let year = window.end.year();
    let week = week_number_of(window.start, year)?;
    Ok(ResolvedWindow {
        window,
        period: Period::Week { week, year },
    })
}
