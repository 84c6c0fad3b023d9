//! Boundaries to external collaborators.
//!
//! Every network-facing piece sits behind one of these traits so the engine
//! can run against HTTP adapters, the in-memory store, or test doubles.

use async_trait::async_trait;
use serde_json::Value;

use super::filter::Filter;
use super::item::SyncItem;
use super::properties::{Properties, Record};
use super::types::SyncError;
use crate::calendar::{CalendarEvent, CalendarEventPayload, TimeWindow};

/// Inbound raw items from an upstream service or export.
#[async_trait]
pub trait RawFeed: Send + Sync {
    async fn fetch_raw(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError>;
}

/// Record CRUD on the destination store.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn query(&self, collection_id: &str, filter: &Filter) -> Result<Vec<Record>, SyncError>;

    async fn create(&self, collection_id: &str, properties: Properties)
        -> Result<Record, SyncError>;

    async fn update(&self, record_id: &str, properties: Properties) -> Result<Record, SyncError>;

    async fn retrieve(&self, record_id: &str) -> Result<Record, SyncError>;
}

/// Event CRUD on the calendar store.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn create_event(
        &self,
        calendar_id: &str,
        payload: &CalendarEventPayload,
    ) -> Result<CalendarEvent, SyncError>;

    /// Events starting inside `window`.
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CalendarEvent>, SyncError>;
}

/// One integration's fetch and transform steps.
#[async_trait]
pub trait SyncSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Value>, SyncError>;

    /// Normalize raw items. One bad item yields one `Err` and never hides
    /// the others.
    fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>>;

    /// Called after an item was written or found to exist already.
    async fn mark_synced(&self, _item: &SyncItem) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Where transformed items are written.
#[async_trait]
pub trait SyncSink: Send + Sync {
    fn name(&self) -> &str;

    /// Id of an existing destination entry carrying the item's natural key.
    async fn find_existing(&self, item: &SyncItem) -> Result<Option<String>, SyncError>;

    /// Write the item, returning the new entry's id.
    async fn create(&self, item: &SyncItem) -> Result<String, SyncError>;

    /// Sinks that never write return true.
    fn is_dry_run(&self) -> bool {
        false
    }
}
