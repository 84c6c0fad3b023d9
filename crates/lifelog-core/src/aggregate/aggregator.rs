use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::format::{format_detail_blocks, truncate_text, TEXT_LIMIT};
use super::{AggregateResult, CategoryTotals};
use crate::calendar::TimeWindow;
use crate::events::{RawEvent, SourceEvent};
use crate::registry::{Categorizer, Measure, SummaryGroup};

/// Computes per-category totals for a window.
///
/// Holds no state between calls; the result is a pure function of the
/// events, the window and the selected groups.
#[derive(Debug, Clone)]
pub struct Aggregator {
    categorizer: Categorizer,
}

/// Hours contributed by one event. Negative and non-finite values count as 0.
pub fn clamp_hours(hours: Option<f64>) -> f64 {
    match hours {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Aggregator {
    pub fn new(categorizer: Categorizer) -> Self {
        Self { categorizer }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Aggregate `events_by_bucket` over `window` for the selected groups.
    ///
    /// Fetch windows are padded, so events outside `window` are expected here
    /// and dropped. Buckets not feeding a selected group are ignored.
    pub fn aggregate(
        &self,
        events_by_bucket: &HashMap<String, Vec<RawEvent>>,
        window: &TimeWindow,
        groups: &[&SummaryGroup],
    ) -> AggregateResult {
        let mut per_category = BTreeMap::new();
        for group in groups {
            let in_window = group
                .buckets
                .iter()
                .filter_map(|bucket| events_by_bucket.get(bucket))
                .flatten()
                .filter(|event| window.contains(event.occurred_on));
            let events = self.categorizer.categorize_all(group, in_window);
            debug!(group = %group.id, events = events.len(), %window, "aggregating group");
            per_category.extend(summarize_group(group, &events));
        }
        AggregateResult {
            window_start: window.start,
            window_end: window.end,
            per_category,
        }
    }
}

/// Totals for every category of `group` from already-categorized events.
pub fn summarize_group(
    group: &SummaryGroup,
    events: &[SourceEvent],
) -> BTreeMap<String, CategoryTotals> {
    group
        .categories
        .iter()
        .map(|category| {
            let matching: Vec<&SourceEvent> =
                events.iter().filter(|e| e.category == category.key).collect();
            (category.key.clone(), summarize(group, &matching))
        })
        .collect()
}

fn summarize(group: &SummaryGroup, events: &[&SourceEvent]) -> CategoryTotals {
    let days: BTreeSet<_> = events.iter().map(|e| e.occurred_on).collect();
    let sessions = group
        .wants(Measure::Sessions)
        .then(|| events.len() as u32);
    let hours_total = group.wants(Measure::Hours).then(|| {
        let sum: f64 = events.iter().map(|e| clamp_hours(e.duration_hours)).sum();
        round2(sum)
    });
    let detail_blocks = group
        .wants(Measure::Details)
        .then(|| truncate_text(&format_detail_blocks(events), TEXT_LIMIT));
    CategoryTotals {
        days: days.len() as u32,
        sessions,
        hours_total,
        detail_blocks,
    }
}
