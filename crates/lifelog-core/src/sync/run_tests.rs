//! Tests for the run-scoped queue.

#[cfg(test)]
mod tests {
    use super::super::item::{NaturalKey, SyncItem};
    use super::super::properties::{Properties, PropertyValue};
    use super::super::run::SyncRun;
    use super::super::types::{RunState, SyncError, SyncRecord, SyncStatus};
    use crate::calendar::TimeWindow;
    use chrono::NaiveDate;

    fn item(id: f64) -> SyncItem {
        SyncItem::record(
            NaturalKey::single("Activity ID", PropertyValue::Number(id)),
            format!("item {id}"),
            Properties::new(),
        )
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(date(3), date(9)).unwrap()
    }

    #[test]
    fn test_new_run_starts_fetching() {
        let run = SyncRun::new("workouts");
        assert_eq!(run.state(), RunState::Fetching);
        assert_eq!(run.pauses(), 0);
        assert_eq!(run.remaining(), 0);
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut run = SyncRun::new("workouts");
        run.enqueue(vec![Ok(item(1.0)), Ok(item(2.0))], &window());
        assert_eq!(run.remaining(), 2);
        assert_eq!(run.next_item().unwrap().title, "item 1");
        assert_eq!(run.next_item().unwrap().title, "item 2");
        assert!(run.next_item().is_none());
    }

    #[test]
    fn test_transform_failures_are_recorded_not_queued() {
        let mut run = SyncRun::new("workouts");
        run.enqueue(
            vec![Ok(item(1.0)), Err(SyncError::transform("missing distance"))],
            &window(),
        );
        assert_eq!(run.remaining(), 1);
        let errors = &run.result().errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].external_id, "workouts#1");
        assert_eq!(errors[0].status, SyncStatus::Errored);
    }

    #[test]
    fn test_items_dated_outside_window_are_not_queued() {
        let mut run = SyncRun::new("sleep");
        run.enqueue(
            vec![
                Ok(item(1.0).on(date(3))),
                Ok(item(2.0).on(date(10))),
                Ok(item(3.0).on(date(2))),
                Err(SyncError::transform("bad")),
                Ok(item(4.0)),
            ],
            &window(),
        );
        assert_eq!(run.remaining(), 2);
        assert_eq!(run.next_item().unwrap().title, "item 1");
        assert_eq!(run.next_item().unwrap().title, "item 4");
        // Positional ids still count the dropped items.
        assert_eq!(run.result().errors[0].external_id, "sleep#3");
    }

    #[test]
    fn test_records_are_bucketed_by_status() {
        let mut run = SyncRun::new("sleep");
        run.record(SyncRecord::created("a", "page-a"));
        run.record(SyncRecord::skipped("b", Some("page-b".into())));
        run.record(SyncRecord::errored("c", "boom"));
        let result = run.finish();
        assert_eq!(result.created.len(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.total(), 3);
        assert!(result.has_errors());
    }

    #[test]
    fn test_failed_fetch_drops_queue() {
        let mut run = SyncRun::new("sleep");
        run.enqueue(vec![Ok(item(1.0))], &window());
        run.fail_fetch(&SyncError::NotFound("feed".into()));
        assert_eq!(run.state(), RunState::Done);
        assert_eq!(run.remaining(), 0);
        let result = run.finish();
        assert_eq!(result.fetch_error.as_deref(), Some("Not found: feed"));
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_pauses_are_counted() {
        let mut run = SyncRun::new("sleep");
        run.note_pause();
        run.note_pause();
        assert_eq!(run.pauses(), 2);
        run.advance(RunState::Checking);
        assert_eq!(run.state(), RunState::Checking);
    }
}
