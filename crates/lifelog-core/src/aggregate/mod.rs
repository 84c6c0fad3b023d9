//! Per-category aggregation over a window.

pub mod aggregator;
pub mod format;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::registry::{CategoryKey, Measure, SummaryGroup};

pub use aggregator::Aggregator;
pub use format::{format_detail_blocks, format_time_range, truncate_text, TEXT_LIMIT, TRUNCATION_MARKER};

/// Totals for one category. Optional fields are present only when the
/// category's group asks for that measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_blocks: Option<String>,
}

/// Output of one aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub per_category: BTreeMap<CategoryKey, CategoryTotals>,
}

/// A measured value ready to be written to a destination property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u32),
    Decimal(f64),
    Text(String),
}

impl AggregateResult {
    pub fn totals(&self, category: &str) -> Option<&CategoryTotals> {
        self.per_category.get(category)
    }

    /// Every `(output_key, value)` pair the groups declare.
    ///
    /// Categories without totals report zero or empty text, so rewriting a
    /// recap clears values left over from an earlier run.
    pub fn metric_values(&self, groups: &[&SummaryGroup]) -> Vec<(String, MetricValue)> {
        let empty = CategoryTotals::default();
        let mut values = Vec::new();
        for group in groups {
            for metric in &group.metrics {
                for category in &group.categories {
                    let totals = self.per_category.get(&category.key).unwrap_or(&empty);
                    let value = match metric.measure {
                        Measure::Days => MetricValue::Count(totals.days),
                        Measure::Sessions => MetricValue::Count(totals.sessions.unwrap_or(0)),
                        Measure::Hours => MetricValue::Decimal(totals.hours_total.unwrap_or(0.0)),
                        Measure::Details => {
                            MetricValue::Text(totals.detail_blocks.clone().unwrap_or_default())
                        }
                    };
                    values.push((metric.output_key_for(category), value));
                }
            }
        }
        values
    }
}
