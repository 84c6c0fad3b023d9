//! Items flowing from a source's transform step into a sink.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::properties::{Properties, PropertyValue};
use crate::calendar::CalendarEventPayload;

/// Stable identity of a source item in the destination.
///
/// Either a single external id (`Activity ID = 123`) or a composite of
/// several properties (`Repository + Date`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalKey {
    parts: Vec<(String, PropertyValue)>,
}

impl NaturalKey {
    pub fn single(property: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            parts: vec![(property.into(), value)],
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: PropertyValue) -> Self {
        self.parts.push((property.into(), value));
        self
    }

    pub fn parts(&self) -> &[(String, PropertyValue)] {
        &self.parts
    }

    /// Equality filter over every key part.
    pub fn to_filter(&self) -> Filter {
        Filter::and(
            self.parts
                .iter()
                .map(|(property, value)| Filter::equals(property.clone(), value.clone()))
                .collect(),
        )
    }

    /// Whether `properties` carries every key part.
    pub fn matches(&self, properties: &Properties) -> bool {
        self.to_filter().matches(properties)
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|(property, value)| format!("{property}={value}"))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

/// What a sink writes for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPayload {
    Record { properties: Properties },
    Event { event: CalendarEventPayload },
}

impl ItemPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ItemPayload::Record { .. } => "record",
            ItemPayload::Event { .. } => "calendar event",
        }
    }
}

/// A transformed source item ready to be checked and written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncItem {
    pub natural_key: NaturalKey,
    pub title: String,
    pub payload: ItemPayload,
    /// Id of the upstream record, when the source needs it to mark the item synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    /// Date the item counts toward, after the source's date rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_on: Option<NaiveDate>,
}

impl SyncItem {
    pub fn record(natural_key: NaturalKey, title: impl Into<String>, properties: Properties) -> Self {
        Self {
            natural_key,
            title: title.into(),
            payload: ItemPayload::Record { properties },
            source_ref: None,
            occurred_on: None,
        }
    }

    pub fn event(natural_key: NaturalKey, event: CalendarEventPayload) -> Self {
        Self {
            natural_key,
            title: event.summary.clone(),
            occurred_on: Some(event.start.date()),
            payload: ItemPayload::Event { event },
            source_ref: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.occurred_on = Some(date);
        self
    }

    pub fn with_source_ref(mut self, id: impl Into<String>) -> Self {
        self.source_ref = Some(id.into());
        self
    }
}
