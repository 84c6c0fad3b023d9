//! Registry building blocks: buckets, summary groups, routing rules, metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calendar::SourceKind;

/// Key identifying a destination category (e.g. `"strength"`).
pub type CategoryKey = String;

/// Where a bucket's events come from.
///
/// Both variants name an alias; the concrete calendar or collection id is
/// looked up in the `[calendars]` / `[collections]` config tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Events on a calendar.
    Calendar { calendar: String },
    /// Records in a destination collection.
    Collection {
        collection: String,
        date_property: String,
        #[serde(default = "default_title_property")]
        title_property: String,
        #[serde(default)]
        hours_property: Option<String>,
        /// Properties copied onto the raw event for property-value routing.
        #[serde(default)]
        signal_properties: Vec<String>,
    },
}

fn default_title_property() -> String {
    "Name".to_string()
}

/// An atomic origin of time-stamped events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub origin: Origin,
    /// Labels of internal splits (color groups, sub-types), informational.
    #[serde(default)]
    pub sub_categories: Vec<String>,
    #[serde(default)]
    pub source: Option<SourceKind>,
}

/// A destination category and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: CategoryKey,
    pub label: String,
}

/// How events in a group pick their category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum RoutingRule {
    /// Every event lands in one fixed category.
    Direct { category: CategoryKey },
    /// An event property selects the category by exact match.
    PropertyValue {
        property: String,
        table: BTreeMap<String, CategoryKey>,
        default: CategoryKey,
    },
    /// The event's color identifier selects the category.
    ColorCode {
        table: BTreeMap<String, CategoryKey>,
        default: CategoryKey,
    },
}

impl RoutingRule {
    /// Every category this rule can produce.
    pub fn targets(&self) -> Vec<&CategoryKey> {
        match self {
            RoutingRule::Direct { category } => vec![category],
            RoutingRule::PropertyValue { table, default, .. }
            | RoutingRule::ColorCode { table, default } => {
                let mut targets: Vec<&CategoryKey> = table.values().collect();
                targets.push(default);
                targets
            }
        }
    }
}

/// What is measured for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Distinct days with at least one event.
    Days,
    /// Number of events.
    Sessions,
    /// Summed duration in hours.
    Hours,
    /// Free-text per-day listing.
    Details,
}

/// Shape of a measured value in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Count,
    Decimal,
    Text,
}

impl Measure {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Measure::Days | Measure::Sessions => ValueKind::Count,
            Measure::Hours => ValueKind::Decimal,
            Measure::Details => ValueKind::Text,
        }
    }
}

/// Placeholder replaced by the category label in output keys.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

/// One measured value and the destination property it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub measure: Measure,
    /// Destination property name; may contain `{category}`.
    pub output_key: String,
}

impl MetricSpec {
    pub fn new(measure: Measure, output_key: impl Into<String>) -> Self {
        Self {
            measure,
            output_key: output_key.into(),
        }
    }

    /// Output key with the category label substituted.
    pub fn output_key_for(&self, category: &Category) -> String {
        self.output_key.replace(CATEGORY_PLACEHOLDER, &category.label)
    }
}

/// One or more buckets reported as a single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryGroup {
    pub id: String,
    pub label: String,
    pub buckets: Vec<String>,
    pub categories: Vec<Category>,
    pub routing: RoutingRule,
    pub metrics: Vec<MetricSpec>,
}

impl SummaryGroup {
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn wants(&self, measure: Measure) -> bool {
        self.metrics.iter().any(|m| m.measure == measure)
    }

    pub fn default_category(&self) -> &CategoryKey {
        match &self.routing {
            RoutingRule::Direct { category } => category,
            RoutingRule::PropertyValue { default, .. } | RoutingRule::ColorCode { default, .. } => {
                default
            }
        }
    }
}
