//! Body-composition scale measurements.
//!
//! Measurements arrive in groups; each measure is an integer `value` scaled
//! by `10^unit`. Only weight (type 1) is recorded.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;

use super::{id_field, round2};
use crate::calendar::{source_date_offset, SourceKind, TimeWindow};
use crate::sync::{
    NaturalKey, Properties, PropertyValue, RawFeed, SyncError, SyncItem, SyncSource,
};

const WEIGHT_MEASURE_TYPE: i64 = 1;
pub const POUNDS_PER_KG: f64 = 2.20462;

pub struct BodyWeightSource {
    feed: Arc<dyn RawFeed>,
    tz: Tz,
}

/// Weight in kilograms from a measure group, if it has one.
fn weight_kg(group: &Value) -> Option<f64> {
    group["measures"].as_array()?.iter().find_map(|m| {
        if m["type"].as_i64()? != WEIGHT_MEASURE_TYPE {
            return None;
        }
        let value = m["value"].as_f64()?;
        let unit = m["unit"].as_i64()? as i32;
        Some(value * 10f64.powi(unit))
    })
}

impl BodyWeightSource {
    pub fn new(feed: Arc<dyn RawFeed>, tz: Tz) -> Self {
        Self { feed, tz }
    }

    fn transform_one(&self, group: &Value, kg: f64) -> Result<SyncItem, SyncError> {
        let id = id_field(group, "grpid")?;
        let measurement_id: f64 = id
            .parse()
            .map_err(|_| SyncError::transform(format!("group id '{id}' is not numeric")))?;
        let epoch = group["date"]
            .as_i64()
            .ok_or_else(|| SyncError::transform("missing measurement time"))?;
        let taken_at = DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| SyncError::transform(format!("measurement time {epoch} out of range")))?;
        let date = source_date_offset(SourceKind::BodyScale, taken_at, self.tz);

        let title = format!("Weigh-in {date}");
        let properties = Properties::from([
            ("Name".to_string(), PropertyValue::Title(title.clone())),
            (
                "Measurement ID".to_string(),
                PropertyValue::Number(measurement_id),
            ),
            ("Date".to_string(), PropertyValue::Date(date)),
            ("Weight (kg)".to_string(), PropertyValue::Number(round2(kg))),
            (
                "Weight (lb)".to_string(),
                PropertyValue::Number(round2(kg * POUNDS_PER_KG)),
            ),
        ]);
        Ok(SyncItem::record(
            NaturalKey::single("Measurement ID", PropertyValue::Number(measurement_id)),
            title,
            properties,
        )
        .on(date))
    }
}

#[async_trait]
impl SyncSource for BodyWeightSource {
    fn name(&self) -> &str {
        "body_weight"
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        self.feed.fetch_raw(window).await
    }

    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
        raw.iter()
            .filter_map(|group| weight_kg(group).map(|kg| self.transform_one(group, kg)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticFeed;
    use crate::sync::ItemPayload;
    use chrono::NaiveDate;
    use serde_json::json;

    fn source() -> BodyWeightSource {
        BodyWeightSource::new(Arc::new(StaticFeed::default()), chrono_tz::America::New_York)
    }

    #[test]
    fn test_scaled_value_and_civil_date() {
        // 2024-03-05T03:00:00Z is the evening of March 4 in New York.
        let items = source().transform(vec![json!({
            "grpid": 555,
            "date": 1709607600,
            "measures": [
                {"type": 6, "value": 215, "unit": -1},
                {"type": 1, "value": 72500, "unit": -3}
            ]
        })]);
        let item = items[0].as_ref().unwrap();
        let ItemPayload::Record { properties } = &item.payload else {
            panic!("expected record payload");
        };
        assert_eq!(
            properties["Date"],
            PropertyValue::Date(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
        );
        assert_eq!(properties["Weight (kg)"], PropertyValue::Number(72.5));
        assert_eq!(properties["Weight (lb)"], PropertyValue::Number(159.83));
        assert_eq!(item.natural_key.to_string(), "Measurement ID=555");
    }

    #[test]
    fn test_groups_without_weight_are_skipped() {
        let items = source().transform(vec![json!({
            "grpid": 556,
            "date": 1709607600,
            "measures": [{"type": 6, "value": 215, "unit": -1}]
        })]);
        assert!(items.is_empty());
    }
}
