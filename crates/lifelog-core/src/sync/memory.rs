//! In-memory destination and calendar store.
//!
//! Behaves like the HTTP adapters for every operation the engine uses, and
//! can be told to fail upcoming calls. Used by tests and by `--dry-run`
//! style local runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::filter::Filter;
use super::ports::{CalendarStore, DestinationStore};
use super::properties::{Properties, Record};
use super::types::SyncError;
use crate::calendar::{CalendarEvent, CalendarEventPayload, TimeWindow};

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Vec<Record>>,
    calendars: BTreeMap<String, Vec<CalendarEvent>>,
    fail_creates: usize,
    fail_queries: usize,
    fail_updates: usize,
    calls: Vec<String>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn injected(op: &str) -> SyncError {
    SyncError::Api {
        service: "memory".to_string(),
        status: 500,
        message: format!("injected {op} failure"),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a record directly, bypassing failure injection.
    pub fn insert(&self, collection_id: &str, properties: Properties) -> Record {
        let record = Record {
            id: Uuid::new_v4().to_string(),
            properties,
        };
        self.state()
            .collections
            .entry(collection_id.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Seed a calendar event directly.
    pub fn insert_event(&self, calendar_id: &str, event: CalendarEvent) {
        self.state()
            .calendars
            .entry(calendar_id.to_string())
            .or_default()
            .push(event);
    }

    /// Make the next `n` record or event creations fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.state().fail_creates = n;
    }

    /// Make the next `n` queries or listings fail.
    pub fn fail_next_queries(&self, n: usize) {
        self.state().fail_queries = n;
    }

    /// Make the next `n` record updates fail.
    pub fn fail_next_updates(&self, n: usize) {
        self.state().fail_updates = n;
    }

    pub fn records(&self, collection_id: &str) -> Vec<Record> {
        self.state()
            .collections
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.state()
            .calendars
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Operations performed so far, e.g. `"query:sleep"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn take_failure(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl DestinationStore for MemoryStore {
    async fn query(&self, collection_id: &str, filter: &Filter) -> Result<Vec<Record>, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("query:{collection_id}"));
        if Self::take_failure(&mut state.fail_queries) {
            return Err(injected("query"));
        }
        Ok(state
            .collections
            .get(collection_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.matches(&r.properties))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection_id: &str,
        properties: Properties,
    ) -> Result<Record, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("create:{collection_id}"));
        if Self::take_failure(&mut state.fail_creates) {
            return Err(injected("create"));
        }
        let record = Record {
            id: Uuid::new_v4().to_string(),
            properties,
        };
        state
            .collections
            .entry(collection_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, record_id: &str, properties: Properties) -> Result<Record, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("update:{record_id}"));
        if Self::take_failure(&mut state.fail_updates) {
            return Err(injected("update"));
        }
        let record = state
            .collections
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == record_id)
            .ok_or_else(|| SyncError::NotFound(format!("record {record_id}")))?;
        record.properties.extend(properties);
        Ok(record.clone())
    }

    async fn retrieve(&self, record_id: &str) -> Result<Record, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("retrieve:{record_id}"));
        state
            .collections
            .values()
            .flatten()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("record {record_id}")))
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn create_event(
        &self,
        calendar_id: &str,
        payload: &CalendarEventPayload,
    ) -> Result<CalendarEvent, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("create_event:{calendar_id}"));
        if Self::take_failure(&mut state.fail_creates) {
            return Err(injected("create_event"));
        }
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            summary: payload.summary.clone(),
            description: payload.description.clone(),
            start: payload.start,
            end: payload.end,
            color_id: payload.color_id.clone(),
            private: payload.private.clone(),
        };
        state
            .calendars
            .entry(calendar_id.to_string())
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CalendarEvent>, SyncError> {
        let mut state = self.state();
        state.calls.push(format!("list_events:{calendar_id}"));
        if Self::take_failure(&mut state.fail_queries) {
            return Err(injected("list_events"));
        }
        Ok(state
            .calendars
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| window.contains(e.occurred_on()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::properties::PropertyValue;

    fn props(name: &str) -> Properties {
        Properties::from([("Name".to_string(), PropertyValue::Title(name.to_string()))])
    }

    #[tokio::test]
    async fn test_create_then_query() {
        let store = MemoryStore::new();
        store.create("c", props("a")).await.unwrap();
        store.create("c", props("b")).await.unwrap();
        let filter = Filter::equals("Name", PropertyValue::Title("b".into()));
        let found = store.query("c", &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(store.query("other", &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_properties() {
        let store = MemoryStore::new();
        let record = store.insert("c", props("a"));
        let mut patch = Properties::new();
        patch.insert("Hours".into(), PropertyValue::Number(2.0));
        let updated = store.update(&record.id, patch).await.unwrap();
        assert_eq!(updated.properties.len(), 2);
        assert_eq!(store.retrieve(&record.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_failure_injection_is_consumed() {
        let store = MemoryStore::new();
        store.fail_next_creates(1);
        assert!(store.create("c", props("a")).await.is_err());
        assert!(store.create("c", props("a")).await.is_ok());
        assert_eq!(store.records("c").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.retrieve("nope").await,
            Err(SyncError::NotFound(_))
        ));
    }
}
