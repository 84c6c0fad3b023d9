//! Mirror destination records onto a calendar.
//!
//! Records in a collection become all-day calendar events. Once an event is
//! written (or found to exist) the record's checkbox is ticked, so later
//! runs only look at records that were never mirrored.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::calendar::{CalendarEventPayload, TimeWindow};
use crate::sync::{
    DestinationStore, Filter, NaturalKey, Properties, PropertyValue, Record, SyncError, SyncItem,
    SyncSource,
};

/// Checkbox set on a record once it has been mirrored.
pub const CALENDAR_SYNCED_PROPERTY: &str = "Calendar Synced";

pub struct CalendarMirrorSource {
    name: String,
    store: Arc<dyn DestinationStore>,
    collection_id: String,
    date_property: String,
    title_property: String,
    hours_property: Option<String>,
    color_id: Option<String>,
}

impl CalendarMirrorSource {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn DestinationStore>,
        collection_id: impl Into<String>,
        date_property: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            collection_id: collection_id.into(),
            date_property: date_property.into(),
            title_property: "Name".to_string(),
            hours_property: None,
            color_id: None,
        }
    }

    pub fn with_title_property(mut self, property: impl Into<String>) -> Self {
        self.title_property = property.into();
        self
    }

    pub fn with_hours_property(mut self, property: impl Into<String>) -> Self {
        self.hours_property = Some(property.into());
        self
    }

    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    fn to_item(&self, record: Record) -> Result<Option<SyncItem>, SyncError> {
        let already = record
            .get(CALENDAR_SYNCED_PROPERTY)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false);
        if already {
            return Ok(None);
        }

        let date = record
            .get(&self.date_property)
            .and_then(PropertyValue::as_date)
            .ok_or_else(|| {
                SyncError::transform(format!(
                    "record {} has no '{}' date",
                    record.id, self.date_property
                ))
            })?;
        let title = record
            .get(&self.title_property)
            .map(PropertyValue::to_plain)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.name.clone());

        let mut event = CalendarEventPayload::all_day(title, date, date);
        if let Some(hours) = self
            .hours_property
            .as_deref()
            .and_then(|p| record.get(p))
            .and_then(PropertyValue::as_number)
        {
            event = event.with_description(format!("{hours} hours"));
        }
        if let Some(color) = &self.color_id {
            event = event.with_color(color.clone());
        }

        let key = NaturalKey::single("Source Record", PropertyValue::Text(record.id.clone()));
        Ok(Some(SyncItem::event(key, event).with_source_ref(record.id)))
    }
}

#[async_trait]
impl SyncSource for CalendarMirrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
        let filter = Filter::date_range(&self.date_property, window.start, window.end);
        let records = self.store.query(&self.collection_id, &filter).await?;
        debug!(collection = %self.collection_id, count = records.len(), "records to mirror");
        records
            .into_iter()
            .map(|r| serde_json::to_value(r).map_err(SyncError::from))
            .collect()
    }

    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
        raw.into_iter()
            .filter_map(|value| {
                serde_json::from_value::<Record>(value)
                    .map_err(SyncError::from)
                    .and_then(|record| self.to_item(record))
                    .transpose()
            })
            .collect()
    }

    async fn mark_synced(&self, item: &SyncItem) -> Result<(), SyncError> {
        let Some(record_id) = &item.source_ref else {
            return Ok(());
        };
        let patch = Properties::from([(
            CALENDAR_SYNCED_PROPERTY.to_string(),
            PropertyValue::Checkbox(true),
        )]);
        self.store.update(record_id, patch).await?;
        Ok(())
    }
}
