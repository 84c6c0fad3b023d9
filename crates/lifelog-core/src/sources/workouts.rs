//! Fitness tracker activities.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{date_field, id_field, num_field, round2, str_field};
use crate::calendar::TimeWindow;
use crate::sync::{
    NaturalKey, Properties, PropertyValue, RawFeed, SyncError, SyncItem, SyncSource,
};

pub const METERS_PER_MILE: f64 = 1609.344;

pub struct WorkoutSource {
    feed: Arc<dyn RawFeed>,
}

impl WorkoutSource {
    pub fn new(feed: Arc<dyn RawFeed>) -> Self {
        Self { feed }
    }

    fn transform_one(item: &Value) -> Result<SyncItem, SyncError> {
        // Kept as text: tracker ids exceed what an f64 holds exactly.
        let id = id_field(item, "id")?;
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SyncError::transform(format!("activity id '{id}' is not numeric")));
        }
        let name = str_field(item, "name").unwrap_or("Workout").to_string();
        let kind = str_field(item, "sport_type")
            .or_else(|_| str_field(item, "type"))
            .unwrap_or("Workout")
            .to_string();
        // start_date_local carries local wall time; its date is the civil date.
        let date = date_field(item, "start_date_local")?;
        let seconds = num_field(item, "moving_time")?.max(0.0);
        let meters = num_field(item, "distance").unwrap_or(0.0).max(0.0);

        let properties = Properties::from([
            ("Name".to_string(), PropertyValue::Title(name.clone())),
            ("Activity ID".to_string(), PropertyValue::Text(id.clone())),
            ("Type".to_string(), PropertyValue::Select(kind)),
            ("Date".to_string(), PropertyValue::Date(date)),
            (
                "Duration (min)".to_string(),
                PropertyValue::Number(round2(seconds / 60.0)),
            ),
            (
                "Hours".to_string(),
                PropertyValue::Number(round2(seconds / 3600.0)),
            ),
            (
                "Distance (mi)".to_string(),
                PropertyValue::Number(round2(meters / METERS_PER_MILE)),
            ),
        ]);
        Ok(SyncItem::record(
            NaturalKey::single("Activity ID", PropertyValue::Text(id)),
            name,
            properties,
        )
        .on(date))
    }
}

#[async_trait]
impl SyncSource for WorkoutSource {
    fn name(&self) -> &str {
        "workouts"
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        self.feed.fetch_raw(window).await
    }

    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
        raw.iter().map(Self::transform_one).collect()
    }
}
