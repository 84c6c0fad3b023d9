//! Calendar event shapes exchanged with the calendar store.
//!
//! All-day events carry an exclusive end date (last day + 1), matching the
//! calendar API convention. Timed events keep their original UTC offset.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::window::TimeWindow;

/// Start or end of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    /// Civil date, read in the timestamp's own offset.
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTime(dt) => dt.date_naive(),
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            EventTime::Date(_) => None,
            EventTime::DateTime(dt) => Some(*dt),
        }
    }
}

/// Payload for creating a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub color_id: Option<String>,
    /// Private key/value metadata stored alongside the event.
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

impl CalendarEventPayload {
    /// All-day event covering `first_day..=last_day`.
    ///
    /// The end is stored exclusive, one day after `last_day`.
    pub fn all_day(summary: impl Into<String>, first_day: NaiveDate, last_day: NaiveDate) -> Self {
        let last_day = last_day.max(first_day);
        Self {
            summary: summary.into(),
            description: String::new(),
            start: EventTime::Date(first_day),
            end: EventTime::Date(last_day + Duration::days(1)),
            color_id: None,
            private: BTreeMap::new(),
        }
    }

    /// All-day event spanning a whole window.
    pub fn for_window(summary: impl Into<String>, window: &TimeWindow) -> Self {
        Self::all_day(summary, window.start, window.end)
    }

    /// Timed event between two instants.
    pub fn timed(
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: String::new(),
            start: EventTime::DateTime(start),
            end: EventTime::DateTime(end.max(start)),
            color_id: None,
            private: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    pub fn with_private(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.private.insert(key.into(), value.into());
        self
    }
}

/// An event as listed by the calendar store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

impl CalendarEvent {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::Date(_))
    }

    /// Date the event counts toward.
    pub fn occurred_on(&self) -> NaiveDate {
        self.start.date()
    }

    /// Last day an all-day event covers (its exclusive end minus one).
    pub fn last_day(&self) -> NaiveDate {
        match self.end {
            EventTime::Date(end) => (end - Duration::days(1)).max(self.start.date()),
            EventTime::DateTime(end) => end.date_naive(),
        }
    }

    /// Length in hours for timed events; all-day events have none.
    pub fn duration_hours(&self) -> Option<f64> {
        match (self.start, self.end) {
            (EventTime::DateTime(start), EventTime::DateTime(end)) => {
                Some((end - start).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        }
    }
}
