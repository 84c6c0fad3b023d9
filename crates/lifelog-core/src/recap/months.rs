//! Which weeks belong to a month.
//!
//! A month recap that already carries a `Weeks` relation is authoritative:
//! the related week records' date ranges are used as-is. Without one the
//! weeks are derived locally with [`month_to_weeks`], which cannot know
//! about weeks that were assigned to a different month by hand.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::writer::RECAP_DATE_PROPERTY;
use crate::calendar::{month_to_weeks, TimeWindow};
use crate::error::CoreError;
use crate::sync::{DestinationStore, PropertyValue};

pub const WEEKS_RELATION_PROPERTY: &str = "Weeks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekSource {
    Relation,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthWeeks {
    pub weeks: Vec<TimeWindow>,
    pub source: WeekSource,
}

pub struct MonthWeekResolver {
    store: Arc<dyn DestinationStore>,
}

impl MonthWeekResolver {
    pub fn new(store: Arc<dyn DestinationStore>) -> Self {
        Self { store }
    }

    /// Weeks of `month`/`year`, read from `month_record` when it has them.
    ///
    /// Lookup failures fall back to the computed weeks with a warning; only
    /// an invalid month is an error.
    pub async fn resolve(
        &self,
        month: u32,
        year: i32,
        month_record: Option<&str>,
    ) -> Result<MonthWeeks, CoreError> {
        let computed = month_to_weeks(month, year)?;
        let Some(record_id) = month_record else {
            return Ok(MonthWeeks {
                weeks: computed,
                source: WeekSource::Computed,
            });
        };

        match self.from_relation(record_id).await {
            Ok(weeks) if !weeks.is_empty() => Ok(MonthWeeks {
                weeks,
                source: WeekSource::Relation,
            }),
            Ok(_) => Ok(MonthWeeks {
                weeks: computed,
                source: WeekSource::Computed,
            }),
            Err(e) => {
                warn!(record = %record_id, error = %e, "week relation unreadable, computing weeks");
                Ok(MonthWeeks {
                    weeks: computed,
                    source: WeekSource::Computed,
                })
            }
        }
    }

    async fn from_relation(&self, record_id: &str) -> Result<Vec<TimeWindow>, CoreError> {
        let month = self.store.retrieve(record_id).await?;
        let ids = month
            .get(WEEKS_RELATION_PROPERTY)
            .and_then(PropertyValue::as_relation)
            .unwrap_or_default()
            .to_vec();

        let mut weeks = Vec::with_capacity(ids.len());
        for id in ids {
            let week = self.store.retrieve(&id).await?;
            match week.get(RECAP_DATE_PROPERTY) {
                Some(PropertyValue::DateRange { start, end }) => {
                    weeks.push(TimeWindow::new(*start, *end)?)
                }
                _ => warn!(record = %id, "week record has no date range, skipped"),
            }
        }
        weeks.sort_by_key(|w| w.start);
        Ok(weeks)
    }
}
