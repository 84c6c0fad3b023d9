//! Tests for the sync orchestrator.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use super::super::item::{NaturalKey, SyncItem};
    use super::super::memory::MemoryStore;
    use super::super::orchestrator::{SyncJob, SyncOrchestrator};
    use super::super::ports::{DestinationStore, SyncSource};
    use super::super::properties::{Properties, PropertyValue};
    use super::super::sinks::{CalendarSink, CollectionSink, DryRunSink};
    use super::super::types::SyncError;
    use super::super::Backoff;
    use crate::calendar::TimeWindow;
    use crate::sources::{CalendarMirrorSource, CALENDAR_SYNCED_PROPERTY};

    struct StaticSource {
        name: String,
        raw: Vec<Value>,
        fail_fetch: bool,
        marked: Mutex<Vec<String>>,
    }

    impl StaticSource {
        fn new(name: &str, raw: Vec<Value>) -> Self {
            Self {
                name: name.to_string(),
                raw,
                fail_fetch: false,
                marked: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                fail_fetch: true,
                ..Self::new(name, vec![])
            }
        }
    }

    #[async_trait]
    impl SyncSource for StaticSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self, _window: &TimeWindow) -> Result<Vec<Value>, SyncError> {
            if self.fail_fetch {
                return Err(SyncError::Api {
                    service: "upstream".into(),
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self.raw.clone())
        }

        fn transform(&self, raw: Vec<Value>) -> Vec<Result<SyncItem, SyncError>> {
            raw.into_iter()
                .map(|value| -> Result<SyncItem, SyncError> {
                    let id = value["id"]
                        .as_f64()
                        .ok_or_else(|| SyncError::transform("missing id"))?;
                    let title = value["title"].as_str().unwrap_or("untitled").to_string();
                    let key = NaturalKey::single("External ID", PropertyValue::Number(id));
                    let properties = Properties::from([
                        ("Name".to_string(), PropertyValue::Title(title.clone())),
                        ("External ID".to_string(), PropertyValue::Number(id)),
                    ]);
                    let mut item = SyncItem::record(key, title, properties);
                    if let Some(day) = value["date"].as_str() {
                        let day = day
                            .parse::<NaiveDate>()
                            .map_err(|e| SyncError::transform(e.to_string()))?;
                        item = item.on(day);
                    }
                    Ok(match value["ref"].as_str() {
                        Some(r) => item.with_source_ref(r),
                        None => item,
                    })
                })
                .collect()
        }

        async fn mark_synced(&self, item: &SyncItem) -> Result<(), SyncError> {
            if let Some(r) = &item.source_ref {
                self.marked.lock().unwrap().push(r.clone());
            }
            Ok(())
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        )
        .unwrap()
    }

    fn items() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Morning run"}),
            json!({"id": 2, "title": "Evening ride"}),
            json!({"id": 3, "title": "Lifting"}),
        ]
    }

    fn orchestrator() -> SyncOrchestrator {
        SyncOrchestrator::new(Backoff::none())
    }

    #[tokio::test]
    async fn test_second_run_skips_everything() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::new("workouts", items());

        let first = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(first.created.len(), 3);
        assert!(first.skipped.is_empty());

        let second = orchestrator().run(&source, &sink, &window()).await;
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 3);
        assert_eq!(store.records("workouts").len(), 3);

        let first_ids: Vec<_> = first.created.iter().map(|r| r.destination_page_id.clone()).collect();
        let second_ids: Vec<_> = second.skipped.iter().map(|r| r.destination_page_id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_check_precedes_every_create() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::new("workouts", items()[..2].to_vec());

        orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(
            store.calls(),
            vec![
                "query:workouts",
                "create:workouts",
                "query:workouts",
                "create:workouts"
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_records_are_not_modified() {
        let store = Arc::new(MemoryStore::new());
        let seeded = store.insert(
            "workouts",
            Properties::from([
                ("Name".to_string(), PropertyValue::Title("Edited by hand".into())),
                ("External ID".to_string(), PropertyValue::Number(1.0)),
            ]),
        );
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::new("workouts", items());

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.created.len(), 2);
        let kept = store.retrieve(&seeded.id).await.unwrap();
        assert_eq!(kept.title(), Some("Edited by hand"));
    }

    #[tokio::test]
    async fn test_fetch_error_contributes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::failing("workouts");

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert!(result.fetch_error.as_ref().unwrap().contains("unavailable"));
        assert_eq!(result.total(), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_fetch_is_a_clean_run() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::new("workouts", vec![]);

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.total(), 0);
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_item_errors_do_not_abort_the_run() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_creates(1);
        let sink = CollectionSink::new(store.clone(), "workouts");
        let mut raw = items();
        raw.push(json!({"title": "no id"}));
        let source = StaticSource::new("workouts", raw);

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.created.len(), 2);
        assert_eq!(result.errors.len(), 2);
        let keys: Vec<&str> = result.errors.iter().map(|r| r.external_id.as_str()).collect();
        assert!(keys.contains(&"External ID=1"));
        assert!(keys.contains(&"workouts#3"));

        // The failed item is picked up by the next run.
        let rerun = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(rerun.created.len(), 1);
        assert_eq!(rerun.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_never_creates() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_queries(1);
        let sink = CollectionSink::new(store.clone(), "workouts");
        let source = StaticSource::new("workouts", items()[..1].to_vec());

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.errors.len(), 1);
        assert!(store.records("workouts").is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let sink = DryRunSink::new(CollectionSink::new(store.clone(), "workouts"));
        let mut raw = items();
        raw[0]["ref"] = json!("upstream-1");
        let source = StaticSource::new("workouts", raw);

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.created.len(), 3);
        assert!(store.records("workouts").is_empty());
        assert!(source.marked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_synced_after_write() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "workouts");
        let mut raw = items();
        raw[1]["ref"] = json!("upstream-2");
        let source = StaticSource::new("workouts", raw);

        orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(*source.marked.lock().unwrap(), vec!["upstream-2".to_string()]);
    }

    #[tokio::test]
    async fn test_run_many_keeps_sources_independent() {
        let store = Arc::new(MemoryStore::new());
        let workouts = StaticSource::new("workouts", items());
        let broken = StaticSource::failing("sleep");
        let sleep = StaticSource::new("sleep", items()[..1].to_vec());
        let workout_sink = CollectionSink::new(store.clone(), "workouts");
        let sleep_sink = CollectionSink::new(store.clone(), "sleep");

        let jobs = [
            SyncJob::new(&workouts, &workout_sink),
            SyncJob::new(&broken, &sleep_sink),
            SyncJob::new(&sleep, &sleep_sink),
        ];
        let results = orchestrator().run_many(&jobs, &window()).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].created.len(), 3);
        assert!(results[1].fetch_error.is_some());
        assert_eq!(results[2].created.len(), 1);
        assert_eq!(store.records("sleep").len(), 1);
    }

    #[tokio::test]
    async fn test_items_outside_window_are_not_written() {
        let store = Arc::new(MemoryStore::new());
        let sink = CollectionSink::new(store.clone(), "sleep");
        let source = StaticSource::new(
            "sleep",
            vec![
                json!({"id": 1, "title": "inside", "date": "2024-03-05"}),
                json!({"id": 2, "title": "january", "date": "2024-01-10"}),
                json!({"id": 3, "title": "last year", "date": "2023-12-01"}),
            ],
        );

        let result = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(result.created.len(), 1);
        assert_eq!(result.total(), 1);
        let records = store.records("sleep");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title(), Some("inside"));
    }

    #[tokio::test]
    async fn test_unmarked_mirror_is_not_duplicated_by_a_wider_rerun() {
        let store = Arc::new(MemoryStore::new());
        let record = store.insert(
            "reading",
            Properties::from([
                ("Name".to_string(), PropertyValue::Title("Dune".into())),
                (
                    "Date".to_string(),
                    PropertyValue::Date(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
                ),
            ]),
        );
        let source = CalendarMirrorSource::new("mirror:reading", store.clone(), "reading", "Date");
        let sink = CalendarSink::new(store.clone(), "personal");

        store.fail_next_updates(1);
        let first = orchestrator().run(&source, &sink, &window()).await;
        assert_eq!(first.created.len(), 1);
        assert!(first.created[0].error.as_deref().unwrap().contains("mark synced"));
        let unmarked = store.retrieve(&record.id).await.unwrap();
        assert_eq!(unmarked.get(CALENDAR_SYNCED_PROPERTY), None);

        let month = TimeWindow::month(3, 2024).unwrap();
        let second = orchestrator().run(&source, &sink, &month).await;
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 1);
        assert_eq!(store.events("personal").len(), 1);
        let marked = store.retrieve(&record.id).await.unwrap();
        assert_eq!(
            marked.get(CALENDAR_SYNCED_PROPERTY),
            Some(&PropertyValue::Checkbox(true))
        );
    }
}
