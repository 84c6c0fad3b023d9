//! Sleep tracker sessions.
//!
//! The tracker labels a session with the morning the sleeper woke up. Records
//! are dated by the night the session began instead, and flagged as a late
//! wake when the wake-up time (in the session's own offset) is after the
//! configured threshold.

use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;

use super::{date_field, id_field, num_field, round2, str_field, timestamp_field};
use crate::calendar::{is_late_wake, source_date_offset, SourceKind, TimeWindow};
use crate::sync::{
    NaturalKey, Properties, PropertyValue, RawFeed, SyncError, SyncItem, SyncSource,
};

/// Only the main sleep of a day is recorded; naps and rests are dropped.
const LONG_SLEEP: &str = "long_sleep";

pub struct SleepSource {
    feed: Arc<dyn RawFeed>,
    tz: Tz,
    late_wake_threshold_hour: u32,
}

impl SleepSource {
    pub fn new(feed: Arc<dyn RawFeed>, tz: Tz, late_wake_threshold_hour: u32) -> Self {
        Self {
            feed,
            tz,
            late_wake_threshold_hour,
        }
    }

    fn transform_one(&self, item: &Value) -> Result<SyncItem, SyncError> {
        let id = id_field(item, "id")?;
        let woke_on = date_field(item, "day")?;
        let night = source_date_offset(SourceKind::SleepTracker, woke_on, self.tz);
        let bedtime = timestamp_field(item, "bedtime_start")?;
        let wake = timestamp_field(item, "bedtime_end")?;
        let seconds = num_field(item, "total_sleep_duration")?.max(0.0);
        let late = is_late_wake(&wake, self.late_wake_threshold_hour);

        let title = format!("Night of {night}");
        let properties = Properties::from([
            ("Name".to_string(), PropertyValue::Title(title.clone())),
            ("Sleep ID".to_string(), PropertyValue::Text(id.clone())),
            ("Night Of".to_string(), PropertyValue::Date(night)),
            ("Bedtime".to_string(), PropertyValue::DateTime(bedtime)),
            ("Wake Time".to_string(), PropertyValue::DateTime(wake)),
            (
                "Sleep Hours".to_string(),
                PropertyValue::Number(round2(seconds / 3600.0)),
            ),
            ("Late Wake".to_string(), PropertyValue::Checkbox(late)),
        ]);
        Ok(SyncItem::record(
            NaturalKey::single("Sleep ID", PropertyValue::Text(id)),
            title,
            properties,
        )
        .on(night))
    }
}

#[async_trait]
impl SyncSource for SleepSource {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        self.feed.fetch_raw(window).await
    }

    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
        raw.iter()
            .filter(|item| str_field(item, "type").map_or(true, |t| t == LONG_SLEEP))
            .map(|item| self.transform_one(item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticFeed;
    use chrono::NaiveDate;
    use serde_json::json;

    fn source() -> SleepSource {
        SleepSource::new(
            Arc::new(StaticFeed::default()),
            chrono_tz::America::New_York,
            7,
        )
    }

    fn session(id: &str, day: &str, kind: &str, wake: &str) -> Value {
        json!({
            "id": id,
            "day": day,
            "type": kind,
            "bedtime_start": "2024-01-14T23:05:00-05:00",
            "bedtime_end": wake,
            "total_sleep_duration": 27000
        })
    }

    fn properties(item: &SyncItem) -> &Properties {
        match &item.payload {
            crate::sync::ItemPayload::Record { properties } => properties,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_night_of_and_hours() {
        let items = source().transform(vec![session(
            "s1",
            "2024-01-15",
            "long_sleep",
            "2024-01-15T06:30:00-05:00",
        )]);
        let item = items[0].as_ref().unwrap();
        let props = properties(item);
        assert_eq!(
            props["Night Of"],
            PropertyValue::Date(NaiveDate::from_ymd_opt(2024, 1, 14).unwrap())
        );
        assert_eq!(props["Sleep Hours"], PropertyValue::Number(7.5));
        assert_eq!(props["Late Wake"], PropertyValue::Checkbox(false));
        assert_eq!(item.natural_key.to_string(), "Sleep ID=s1");
    }

    #[test]
    fn test_late_wake_is_flagged() {
        let items = source().transform(vec![session(
            "s2",
            "2024-01-15",
            "long_sleep",
            "2024-01-15T07:30:00-05:00",
        )]);
        let props = properties(items[0].as_ref().unwrap());
        assert_eq!(props["Late Wake"], PropertyValue::Checkbox(true));
    }

    #[test]
    fn test_naps_are_dropped_and_bad_items_reported() {
        let broken = session("s4", "2024-01-15", "long_sleep", "not a time");
        let items = source().transform(vec![
            session("s3", "2024-01-15", "rest", "2024-01-15T14:00:00-05:00"),
            broken,
        ]);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(SyncError::Transform(_))));
    }
}
