//! Typed destination properties.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A property value as stored in a destination record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Title(String),
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateRange { start: NaiveDate, end: NaiveDate },
    DateTime(DateTime<FixedOffset>),
    Select(String),
    Checkbox(bool),
    Relation(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Title(s) | PropertyValue::Text(s) | PropertyValue::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Checkbox(b) => Some(*b),
            _ => None,
        }
    }

    /// Start date of date-like values.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            PropertyValue::DateRange { start, .. } => Some(*start),
            PropertyValue::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&[String]> {
        match self {
            PropertyValue::Relation(ids) => Some(ids),
            _ => None,
        }
    }

    /// Plain-text rendering used for routing signals and natural keys.
    pub fn to_plain(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Title(s) | PropertyValue::Text(s) | PropertyValue::Select(s) => {
                f.write_str(s)
            }
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Date(d) => write!(f, "{d}"),
            PropertyValue::DateRange { start, end } => write!(f, "{start}/{end}"),
            PropertyValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            PropertyValue::Checkbox(b) => write!(f, "{b}"),
            PropertyValue::Relation(ids) => f.write_str(&ids.join(",")),
        }
    }
}

/// Property name to value.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A record held by a destination store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub properties: Properties,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.properties.values().find_map(|v| match v {
            PropertyValue::Title(s) => Some(s.as_str()),
            _ => None,
        })
    }
}
