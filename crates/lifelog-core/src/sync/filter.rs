//! Query filters for destination stores.
//!
//! Only three shapes are ever built: conjunction, property equality and an
//! inclusive date range. Adapters translate the tree to their own syntax.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::properties::{Properties, PropertyValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    And { filters: Vec<Filter> },
    Equals { property: String, value: PropertyValue },
    DateRange {
        property: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl Filter {
    pub fn equals(property: impl Into<String>, value: PropertyValue) -> Self {
        Filter::Equals {
            property: property.into(),
            value,
        }
    }

    pub fn date_range(property: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Filter::DateRange {
            property: property.into(),
            start,
            end,
        }
    }

    /// Conjunction; a single filter is returned unwrapped.
    pub fn and(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            if let Some(only) = filters.pop() {
                return only;
            }
        }
        Filter::And { filters }
    }

    /// Evaluate against a property map.
    ///
    /// Equality on plain-text values compares rendered text so a title and a
    /// rich-text property holding the same string match.
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Filter::And { filters } => filters.iter().all(|f| f.matches(properties)),
            Filter::Equals { property, value } => match properties.get(property) {
                Some(actual) => values_equal(actual, value),
                None => false,
            },
            Filter::DateRange {
                property,
                start,
                end,
            } => properties
                .get(property)
                .and_then(PropertyValue::as_date)
                .is_some_and(|d| d >= *start && d <= *end),
        }
    }
}

fn values_equal(actual: &PropertyValue, expected: &PropertyValue) -> bool {
    match (actual.as_str(), expected.as_str()) {
        (Some(a), Some(b)) => a == b,
        _ => match (actual.as_date(), expected) {
            (Some(a), PropertyValue::Date(b)) => a == *b,
            _ => actual == expected,
        },
    }
}
