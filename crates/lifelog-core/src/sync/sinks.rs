//! Sink implementations over the store ports.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::item::{ItemPayload, SyncItem};
use super::ports::{CalendarStore, DestinationStore, SyncSink};
use super::types::SyncError;
use crate::calendar::TimeWindow;

/// Private event property holding the natural key of a mirrored item.
pub const CALENDAR_KEY_PROPERTY: &str = "lifelog_key";

/// Writes record items into a destination collection.
pub struct CollectionSink {
    store: Arc<dyn DestinationStore>,
    collection_id: String,
}

impl CollectionSink {
    pub fn new(store: Arc<dyn DestinationStore>, collection_id: impl Into<String>) -> Self {
        Self {
            store,
            collection_id: collection_id.into(),
        }
    }
}

#[async_trait]
impl SyncSink for CollectionSink {
    fn name(&self) -> &str {
        &self.collection_id
    }

    async fn find_existing(&self, item: &SyncItem) -> Result<Option<String>, SyncError> {
        let key = &item.natural_key;
        let matches = self.store.query(&self.collection_id, &key.to_filter()).await?;
        if matches.len() > 1 {
            debug!(key = %key, count = matches.len(), "natural key matched several records");
        }
        Ok(matches.into_iter().next().map(|r| r.id))
    }

    async fn create(&self, item: &SyncItem) -> Result<String, SyncError> {
        match &item.payload {
            ItemPayload::Record { properties } => {
                let record = self
                    .store
                    .create(&self.collection_id, properties.clone())
                    .await?;
                Ok(record.id)
            }
            other => Err(SyncError::UnsupportedPayload(other.kind())),
        }
    }
}

/// Writes event items onto a calendar.
///
/// Calendars have no queryable properties, so the natural key is stored in a
/// private event property. Existence is checked by listing the days around
/// the item's own date, independent of the window the run was started with.
pub struct CalendarSink {
    store: Arc<dyn CalendarStore>,
    calendar_id: String,
    padding_days: i64,
}

impl CalendarSink {
    pub fn new(store: Arc<dyn CalendarStore>, calendar_id: impl Into<String>) -> Self {
        Self {
            store,
            calendar_id: calendar_id.into(),
            padding_days: 1,
        }
    }

    pub fn with_padding_days(mut self, days: i64) -> Self {
        self.padding_days = days.max(0);
        self
    }

    /// Days listed when looking for an already mirrored item.
    pub fn search_window(&self, item: &SyncItem) -> Result<TimeWindow, SyncError> {
        let date = item.occurred_on.ok_or_else(|| {
            SyncError::transform(format!("calendar item {} has no date", item.natural_key))
        })?;
        Ok(TimeWindow::single_day(date).padded(self.padding_days))
    }
}

#[async_trait]
impl SyncSink for CalendarSink {
    fn name(&self) -> &str {
        &self.calendar_id
    }

    async fn find_existing(&self, item: &SyncItem) -> Result<Option<String>, SyncError> {
        let wanted = item.natural_key.to_string();
        let search = self.search_window(item)?;
        let events = self.store.list_events(&self.calendar_id, &search).await?;
        Ok(events
            .into_iter()
            .find(|e| e.private.get(CALENDAR_KEY_PROPERTY) == Some(&wanted))
            .map(|e| e.id))
    }

    async fn create(&self, item: &SyncItem) -> Result<String, SyncError> {
        match &item.payload {
            ItemPayload::Event { event } => {
                let payload = event
                    .clone()
                    .with_private(CALENDAR_KEY_PROPERTY, item.natural_key.to_string());
                let created = self.store.create_event(&self.calendar_id, &payload).await?;
                Ok(created.id)
            }
            other => Err(SyncError::UnsupportedPayload(other.kind())),
        }
    }
}

/// Performs the existence check against a real sink but never writes.
pub struct DryRunSink<S> {
    inner: S,
}

impl<S: SyncSink> DryRunSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SyncSink> SyncSink for DryRunSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find_existing(&self, item: &SyncItem) -> Result<Option<String>, SyncError> {
        self.inner.find_existing(item).await
    }

    async fn create(&self, item: &SyncItem) -> Result<String, SyncError> {
        Ok(format!("dry-run:{}", item.natural_key))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
