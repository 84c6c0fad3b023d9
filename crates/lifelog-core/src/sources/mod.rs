//! Transform steps for each upstream integration.
//!
//! Each source pairs a [`RawFeed`] with the field mapping and unit
//! conversions for its service, and produces [`SyncItem`]s keyed by a stable
//! natural key. Fetch clients for the trackers themselves live outside this
//! crate; their exports enter through [`FileFeed`] or any other feed.
//!
//! [`SyncItem`]: crate::sync::SyncItem

pub mod body_weight;
pub mod calendar_mirror;
pub mod coding;
pub mod sleep;
pub mod workouts;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value;

use crate::calendar::TimeWindow;
use crate::sync::{RawFeed, SyncError};

pub use body_weight::BodyWeightSource;
pub use calendar_mirror::{CalendarMirrorSource, CALENDAR_SYNCED_PROPERTY};
pub use coding::CodingSource;
pub use sleep::SleepSource;
pub use workouts::WorkoutSource;

/// Reads a JSON array (or an object with an array under `data`) from disk.
///
/// The whole file is returned. Exports are dated by their source's own
/// rule, so the orchestrator drops items outside the run window after the
/// transform step.
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RawFeed for FileFeed {
    async fn fetch_raw(&self, _window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Array(items) => Ok(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(SyncError::transform(format!(
                    "{} holds no item array",
                    self.path.display()
                ))),
            },
            _ => Err(SyncError::transform(format!(
                "{} holds no item array",
                self.path.display()
            ))),
        }
    }
}

/// Feed returning a fixed list; handy for tests and piping.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    items: Vec<Value>,
}

impl StaticFeed {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl RawFeed for StaticFeed {
    async fn fetch_raw(&self, _window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        Ok(self.items.clone())
    }
}

pub(crate) fn str_field<'a>(item: &'a Value, field: &str) -> Result<&'a str, SyncError> {
    item[field]
        .as_str()
        .ok_or_else(|| SyncError::transform(format!("missing string field '{field}'")))
}

pub(crate) fn num_field(item: &Value, field: &str) -> Result<f64, SyncError> {
    item[field]
        .as_f64()
        .ok_or_else(|| SyncError::transform(format!("missing numeric field '{field}'")))
}

pub(crate) fn date_field(item: &Value, field: &str) -> Result<NaiveDate, SyncError> {
    let raw = str_field(item, field)?;
    // Accept both plain dates and full timestamps.
    let day = raw.get(..10).unwrap_or(raw);
    day.parse()
        .map_err(|e| SyncError::transform(format!("bad date in '{field}': {raw} ({e})")))
}

pub(crate) fn timestamp_field(
    item: &Value,
    field: &str,
) -> Result<DateTime<FixedOffset>, SyncError> {
    let raw = str_field(item, field)?;
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| SyncError::transform(format!("bad timestamp in '{field}': {raw} ({e})")))
}

/// Id fields arrive as numbers from some services and strings from others.
pub(crate) fn id_field(item: &Value, field: &str) -> Result<String, SyncError> {
    match &item[field] {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(SyncError::transform(format!("missing id field '{field}'"))),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
