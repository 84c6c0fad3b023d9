use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;

/// An event as fetched from a bucket, before it has been routed.
///
/// Carries every routing signal the origin offers: a color code for
/// calendar events, string properties for collection records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub bucket: String,
    pub occurred_on: NaiveDate,
    pub label: String,
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl RawEvent {
    /// Minimal event on a date, mostly useful for collection records.
    pub fn on(bucket: impl Into<String>, occurred_on: NaiveDate, label: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            occurred_on,
            label: label.into(),
            duration_hours: None,
            is_all_day: false,
            start_time: None,
            end_time: None,
            color_id: None,
            properties: BTreeMap::new(),
        }
    }

    /// Convert a listed calendar event. Timed events keep their offset.
    pub fn from_calendar(bucket: impl Into<String>, event: &CalendarEvent) -> Self {
        Self {
            bucket: bucket.into(),
            occurred_on: event.occurred_on(),
            label: event.summary.clone(),
            duration_hours: event.duration_hours(),
            is_all_day: event.is_all_day(),
            start_time: event.start.as_datetime(),
            end_time: event.end.as_datetime(),
            color_id: event.color_id.clone(),
            properties: event.private.clone(),
        }
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.duration_hours = Some(hours);
        self
    }

    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_times(mut self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self
    }

    /// Freeze into a [`SourceEvent`] under `category`.
    pub fn into_source_event(self, category: impl Into<String>) -> SourceEvent {
        SourceEvent {
            category: category.into(),
            occurred_on: self.occurred_on,
            duration_hours: self.duration_hours,
            label: self.label,
            is_all_day: self.is_all_day,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// A normalized, categorized event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub category: String,
    pub occurred_on: NaiveDate,
    pub duration_hours: Option<f64>,
    pub label: String,
    pub is_all_day: bool,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
}
