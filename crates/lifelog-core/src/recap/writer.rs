//! Upsert a recap record keyed by its title.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::aggregate::MetricValue;
use crate::calendar::TimeWindow;
use crate::sync::{DestinationStore, NaturalKey, Properties, PropertyValue, SyncError};

pub const RECAP_TITLE_PROPERTY: &str = "Name";
pub const RECAP_DATE_PROPERTY: &str = "Date";

/// Whether the recap record was new or rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecapAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenRecap {
    pub record_id: String,
    pub title: String,
    pub action: RecapAction,
}

impl From<MetricValue> for PropertyValue {
    fn from(value: MetricValue) -> Self {
        match value {
            MetricValue::Count(n) => PropertyValue::Number(f64::from(n)),
            MetricValue::Decimal(n) => PropertyValue::Number(n),
            MetricValue::Text(s) => PropertyValue::Text(s),
        }
    }
}

pub struct RecapWriter {
    store: Arc<dyn DestinationStore>,
    collection_id: String,
}

impl RecapWriter {
    pub fn new(store: Arc<dyn DestinationStore>, collection_id: impl Into<String>) -> Self {
        Self {
            store,
            collection_id: collection_id.into(),
        }
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// Properties written for a recap: title, date range, then every metric.
    pub fn properties(
        title: &str,
        window: &TimeWindow,
        values: Vec<(String, MetricValue)>,
    ) -> Properties {
        let mut properties = Properties::from([
            (
                RECAP_TITLE_PROPERTY.to_string(),
                PropertyValue::Title(title.to_string()),
            ),
            (
                RECAP_DATE_PROPERTY.to_string(),
                PropertyValue::DateRange {
                    start: window.start,
                    end: window.end,
                },
            ),
        ]);
        properties.extend(values.into_iter().map(|(key, value)| (key, value.into())));
        properties
    }

    /// Id of the recap titled `title`, if one exists.
    pub async fn find(&self, title: &str) -> Result<Option<String>, SyncError> {
        let key = NaturalKey::single(
            RECAP_TITLE_PROPERTY,
            PropertyValue::Title(title.to_string()),
        );
        let existing = self
            .store
            .query(&self.collection_id, &key.to_filter())
            .await?;
        Ok(existing.into_iter().next().map(|record| record.id))
    }

    /// Create the recap, or overwrite its values when it already exists.
    pub async fn upsert(
        &self,
        title: &str,
        window: &TimeWindow,
        values: Vec<(String, MetricValue)>,
    ) -> Result<WrittenRecap, SyncError> {
        let properties = Self::properties(title, window, values);
        let (record_id, action) = match self.find(title).await? {
            Some(id) => {
                self.store.update(&id, properties).await?;
                (id, RecapAction::Updated)
            }
            None => {
                let record = self.store.create(&self.collection_id, properties).await?;
                (record.id, RecapAction::Created)
            }
        };
        debug!(%title, ?action, record = %record_id, "recap written");
        Ok(WrittenRecap {
            record_id,
            title: title.to_string(),
            action,
        })
    }

    /// Point the `property` relation of `record_id` at `related`.
    pub async fn link(
        &self,
        record_id: &str,
        property: &str,
        related: Vec<String>,
    ) -> Result<(), SyncError> {
        let patch = Properties::from([(property.to_string(), PropertyValue::Relation(related))]);
        self.store.update(record_id, patch).await?;
        Ok(())
    }
}
