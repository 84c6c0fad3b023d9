//! Fetch, transform, check, write.
//!
//! Items are handled strictly one after another. Every external call is
//! preceded by the configured backoff pause. A natural-key lookup always
//! precedes a create: it is the only deduplication the engine has, which
//! makes re-running over the same window a no-op for items already synced.

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use super::backoff::Backoff;
use super::item::SyncItem;
use super::ports::{SyncSink, SyncSource};
use super::run::SyncRun;
use super::types::{RunState, SyncError, SyncRecord, SyncRunResult};
use crate::calendar::TimeWindow;

/// A source paired with the sink its items go to.
#[derive(Clone, Copy)]
pub struct SyncJob<'a> {
    pub source: &'a dyn SyncSource,
    pub sink: &'a dyn SyncSink,
}

impl<'a> SyncJob<'a> {
    pub fn new(source: &'a dyn SyncSource, sink: &'a dyn SyncSink) -> Self {
        Self { source, sink }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOrchestrator {
    backoff: Backoff,
}

impl SyncOrchestrator {
    pub fn new(backoff: Backoff) -> Self {
        Self { backoff }
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    async fn pause(&self, run: &mut SyncRun) {
        self.backoff.pause().await;
        run.note_pause();
    }

    /// Sync one source into one sink.
    pub async fn run(
        &self,
        source: &dyn SyncSource,
        sink: &dyn SyncSink,
        window: &TimeWindow,
    ) -> SyncRunResult {
        let mut run = SyncRun::new(source.name());
        self.pause(&mut run).await;
        let fetched = source.fetch(window).await;
        self.process(run, fetched, window, source, sink).await
    }

    /// Sync several independent sources.
    ///
    /// Fetches run concurrently; each source's writes then run serially,
    /// one source after another.
    pub async fn run_many(&self, jobs: &[SyncJob<'_>], window: &TimeWindow) -> Vec<SyncRunResult> {
        let fetches = join_all(jobs.iter().map(|job| async move {
            self.backoff.pause().await;
            job.source.fetch(window).await
        }))
        .await;

        let mut results = Vec::with_capacity(jobs.len());
        for (job, fetched) in jobs.iter().zip(fetches) {
            let mut run = SyncRun::new(job.source.name());
            run.note_pause();
            results.push(self.process(run, fetched, window, job.source, job.sink).await);
        }
        results
    }

    /// Drive a run whose fetch step has already completed.
    ///
    /// Feeds may return more than `window` (whole exports, padded queries);
    /// only items whose date falls inside it are written.
    pub async fn process(
        &self,
        mut run: SyncRun,
        fetched: Result<Vec<Value>, SyncError>,
        window: &TimeWindow,
        source: &dyn SyncSource,
        sink: &dyn SyncSink,
    ) -> SyncRunResult {
        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                warn!(source = %run.source(), error = %e, "fetch failed");
                run.fail_fetch(&e);
                return run.finish();
            }
        };

        run.advance(RunState::Transforming);
        run.enqueue(source.transform(raw), window);

        while let Some(item) = run.next_item() {
            let record = self.sync_item(&mut run, &item, source, sink).await;
            run.record(record);
        }

        let result = run.finish();
        info!(
            source = %result.source,
            sink = sink.name(),
            created = result.created.len(),
            skipped = result.skipped.len(),
            errors = result.errors.len(),
            "sync run finished"
        );
        result
    }

    async fn sync_item(
        &self,
        run: &mut SyncRun,
        item: &SyncItem,
        source: &dyn SyncSource,
        sink: &dyn SyncSink,
    ) -> SyncRecord {
        let key = item.natural_key.to_string();

        run.advance(RunState::Checking);
        self.pause(run).await;
        let existing = match sink.find_existing(item).await {
            Ok(existing) => existing,
            Err(e) => return SyncRecord::errored(key, e.to_string()),
        };

        let mut record = match existing {
            Some(id) => SyncRecord::skipped(&key, Some(id)),
            None => {
                run.advance(RunState::Writing);
                self.pause(run).await;
                match sink.create(item).await {
                    Ok(id) => SyncRecord::created(&key, id),
                    Err(e) => return SyncRecord::errored(key, e.to_string()),
                }
            }
        };

        if !sink.is_dry_run() && item.source_ref.is_some() {
            self.pause(run).await;
            if let Err(e) = source.mark_synced(item).await {
                warn!(source = %run.source(), key = %key, error = %e, "mark synced failed");
                record.error = Some(format!("mark synced failed: {e}"));
            }
        }
        record
    }
}
