//! Integration tests for the sync -> recap pipeline.
//!
//! A workout export is synced into an in-memory destination, synced again to
//! prove nothing is duplicated, and then summarized into a week recap with the
//! built-in registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use lifelog_core::calendar::WindowSelector;
use lifelog_core::recap::{
    EventCollector, MonthWeekResolver, RecapAction, RecapService, RecapWriter,
};
use lifelog_core::sources::{FileFeed, WorkoutSource};
use lifelog_core::sync::{
    Backoff, CollectionSink, DryRunSink, MemoryStore, PropertyValue, SyncOrchestrator,
};
use lifelog_core::{Aggregator, Categorizer, Registry, TimeWindow};
use serde_json::json;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn week_ten() -> TimeWindow {
    TimeWindow::new(date(3, 3), date(3, 9)).unwrap()
}

fn write_export(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("workouts.json");
    let export = json!([
        { "id": 1, "name": "Bench", "sport_type": "WeightTraining",
          "start_date_local": "2024-03-04T07:00:00Z", "moving_time": 3600, "distance": 0 },
        { "id": 2, "name": "Squats", "sport_type": "WeightTraining",
          "start_date_local": "2024-03-04T18:00:00Z", "moving_time": 1800, "distance": 0 },
        { "id": 3, "name": "Deadlift", "sport_type": "WeightTraining",
          "start_date_local": "2024-03-06T07:00:00Z", "moving_time": 3600, "distance": 0 },
        { "id": 4, "name": "Easy run", "sport_type": "Run",
          "start_date_local": "2024-03-07T06:30:00Z", "moving_time": 1800, "distance": 5000 },
        { "id": 5, "name": "Next week", "sport_type": "Run",
          "start_date_local": "2024-03-12T06:30:00Z", "moving_time": 1800, "distance": 5000 }
    ]);
    std::fs::write(&path, export.to_string()).unwrap();
    path
}

fn recap_service(store: Arc<MemoryStore>) -> RecapService {
    let registry = Arc::new(Registry::builtin().unwrap());
    let collector = EventCollector::new(store.clone(), store.clone(), chrono_tz::UTC)
        .with_aliases(
            BTreeMap::from([("workouts".to_string(), "db-workouts".to_string())]),
            BTreeMap::new(),
        );
    RecapService::new(
        collector,
        Aggregator::new(Categorizer::new(registry)),
        RecapWriter::new(store.clone(), "db-weeks"),
        RecapWriter::new(store.clone(), "db-months"),
        MonthWeekResolver::new(store),
    )
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_workout_sync_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path());
    let store = Arc::new(MemoryStore::new());
    let source = WorkoutSource::new(Arc::new(FileFeed::new(export)));
    let sink = CollectionSink::new(store.clone(), "db-workouts");
    let orchestrator = SyncOrchestrator::new(Backoff::none());

    // The export also holds an activity from the following week.
    let first = orchestrator.run(&source, &sink, &week_ten()).await;
    assert_eq!(first.created.len(), 4);
    assert!(first.errors.is_empty());

    let second = orchestrator.run(&source, &sink, &week_ten()).await;
    assert_eq!(second.created.len(), 0);
    assert_eq!(second.skipped.len(), 4);
    assert_eq!(store.records("db-workouts").len(), 4);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path());
    let store = Arc::new(MemoryStore::new());
    let source = WorkoutSource::new(Arc::new(FileFeed::new(export)));
    let sink = DryRunSink::new(CollectionSink::new(store.clone(), "db-workouts"));

    let result = SyncOrchestrator::new(Backoff::none())
        .run(&source, &sink, &week_ten())
        .await;

    assert_eq!(result.created.len(), 4);
    assert!(store.records("db-workouts").is_empty());
    assert!(!store.calls().iter().any(|c| c.starts_with("create:")));
}

// ============================================================================
// Sync then recap
// ============================================================================

#[tokio::test]
async fn test_synced_workouts_roll_up_into_week_recap() {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path());
    let store = Arc::new(MemoryStore::new());
    let source = WorkoutSource::new(Arc::new(FileFeed::new(export)));
    let sink = CollectionSink::new(store.clone(), "db-workouts");
    SyncOrchestrator::new(Backoff::none())
        .run(&source, &sink, &week_ten())
        .await;

    let service = recap_service(store.clone());
    let groups = vec!["workouts".to_string()];
    let report = service
        .week_recap(WindowSelector::LastWeek, date(3, 13), &groups)
        .await
        .unwrap();

    assert_eq!(report.title, "Week 10 2024");
    let strength = report.aggregate.totals("strength").unwrap();
    assert_eq!(strength.days, 2);
    assert_eq!(strength.sessions, Some(3));
    assert_eq!(strength.hours_total, Some(2.5));
    let cardio = report.aggregate.totals("cardio").unwrap();
    assert_eq!(cardio.days, 1);
    let other = report.aggregate.totals("other_workout").unwrap();
    assert_eq!(other.days, 0);

    let written = report.written.unwrap();
    assert_eq!(written.action, RecapAction::Created);
    let weeks = store.records("db-weeks");
    assert_eq!(weeks.len(), 1);
    assert_eq!(weeks[0].get("Strength Days"), Some(&PropertyValue::Number(2.0)));
    assert_eq!(weeks[0].get("Strength Sessions"), Some(&PropertyValue::Number(3.0)));
    assert_eq!(weeks[0].get("Other Workout Hours"), Some(&PropertyValue::Number(0.0)));
}

#[tokio::test]
async fn test_recap_rerun_overwrites_instead_of_duplicating() {
    let store = Arc::new(MemoryStore::new());
    let service = recap_service(store.clone());
    let groups = vec!["workouts".to_string()];

    let first = service
        .week_recap(WindowSelector::Week { week: 10, year: 2024 }, date(3, 13), &groups)
        .await
        .unwrap();
    let second = service
        .week_recap(WindowSelector::Week { week: 10, year: 2024 }, date(3, 13), &groups)
        .await
        .unwrap();

    assert_eq!(first.written.unwrap().action, RecapAction::Created);
    assert_eq!(second.written.unwrap().action, RecapAction::Updated);
    assert_eq!(store.records("db-weeks").len(), 1);
}

#[tokio::test]
async fn test_week_recap_rejects_month_window() {
    let store = Arc::new(MemoryStore::new());
    let service = recap_service(store.clone());
    let result = service
        .week_recap(WindowSelector::Month { month: 3, year: 2024 }, date(3, 13), &[])
        .await;
    assert!(result.is_err());
    assert!(store.calls().is_empty());
}
