//! Run-scoped queue and bookkeeping.
//!
//! A [`SyncRun`] owns everything one source's run produces: the queue of
//! transformed items still to be written, the records of items already
//! handled, the current step, and the number of backoff pauses taken. The
//! orchestrator drives it one item at a time.

use std::collections::VecDeque;

use tracing::debug;

use super::item::SyncItem;
use super::types::{RunState, SyncError, SyncRecord, SyncRunResult};
use crate::calendar::TimeWindow;

#[derive(Debug)]
pub struct SyncRun {
    state: RunState,
    queue: VecDeque<SyncItem>,
    result: SyncRunResult,
    pauses: u32,
}

impl SyncRun {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            state: RunState::Fetching,
            queue: VecDeque::new(),
            result: SyncRunResult::new(source),
            pauses: 0,
        }
    }

    pub fn source(&self) -> &str {
        &self.result.source
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn advance(&mut self, next: RunState) {
        if self.state != next {
            debug!(source = %self.result.source, from = ?self.state, to = ?next, "sync state");
            self.state = next;
        }
    }

    /// Queue transformed items dated inside `window`. Undated items are
    /// queued too. Failed transforms are recorded as errors straight away
    /// under a positional id.
    pub fn enqueue(&mut self, items: Vec<Result<SyncItem, SyncError>>, window: &TimeWindow) {
        let mut outside = 0usize;
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Ok(item) if item.occurred_on.is_some_and(|d| !window.contains(d)) => {
                    outside += 1;
                }
                Ok(item) => self.queue.push_back(item),
                Err(e) => {
                    let id = format!("{}#{index}", self.result.source);
                    self.result.push(SyncRecord::errored(id, e.to_string()));
                }
            }
        }
        if outside > 0 {
            debug!(source = %self.result.source, outside, %window, "items outside window dropped");
        }
    }

    pub fn next_item(&mut self) -> Option<SyncItem> {
        self.queue.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn record(&mut self, record: SyncRecord) {
        debug!(
            source = %self.result.source,
            key = %record.external_id,
            status = ?record.status,
            "item processed"
        );
        self.result.push(record);
    }

    /// Abort the run after a failed fetch. Nothing queued is written.
    pub fn fail_fetch(&mut self, error: &SyncError) {
        self.result.fetch_error = Some(error.to_string());
        self.queue.clear();
        self.state = RunState::Done;
    }

    pub fn note_pause(&mut self) {
        self.pauses += 1;
    }

    pub fn pauses(&self) -> u32 {
        self.pauses
    }

    pub fn result(&self) -> &SyncRunResult {
        &self.result
    }

    pub fn finish(mut self) -> SyncRunResult {
        self.advance(RunState::Done);
        self.result
    }
}
