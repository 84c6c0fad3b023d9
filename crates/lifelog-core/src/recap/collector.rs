//! Fetch raw events for the buckets behind a recap.
//!
//! Every bucket is fetched over the window padded on both sides, then
//! converted to [`RawEvent`]s. The aggregator does the exact window filter.
//! A bucket that fails to fetch is reported and contributes nothing; only a
//! missing alias aborts, and it does so before any request is sent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar::{civil_date, RawDate, TimeWindow};
use crate::error::ConfigError;
use crate::events::RawEvent;
use crate::registry::{Bucket, Origin};
use crate::sync::{CalendarStore, DestinationStore, Filter, PropertyValue, Record, SyncError};

/// A bucket whose fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketError {
    pub bucket: String,
    pub message: String,
}

/// Events gathered for one recap, keyed by bucket id.
#[derive(Debug, Default)]
pub struct Collected {
    pub events: HashMap<String, Vec<RawEvent>>,
    pub errors: Vec<BucketError>,
}

/// Where a bucket is read from once its alias is resolved.
enum Target<'a> {
    Calendar(String),
    Collection { id: String, origin: &'a Origin },
}

pub struct EventCollector {
    destination: Arc<dyn DestinationStore>,
    calendars: Arc<dyn CalendarStore>,
    collection_ids: BTreeMap<String, String>,
    calendar_ids: BTreeMap<String, String>,
    tz: Tz,
    padding_days: i64,
}

impl EventCollector {
    pub fn new(
        destination: Arc<dyn DestinationStore>,
        calendars: Arc<dyn CalendarStore>,
        tz: Tz,
    ) -> Self {
        Self {
            destination,
            calendars,
            collection_ids: BTreeMap::new(),
            calendar_ids: BTreeMap::new(),
            tz,
            padding_days: 1,
        }
    }

    /// Alias tables, normally the `[collections]` and `[calendars]` config sections.
    pub fn with_aliases(
        mut self,
        collections: BTreeMap<String, String>,
        calendars: BTreeMap<String, String>,
    ) -> Self {
        self.collection_ids = collections;
        self.calendar_ids = calendars;
        self
    }

    pub fn with_padding_days(mut self, days: i64) -> Self {
        self.padding_days = days.max(0);
        self
    }

    fn resolve<'a>(&self, bucket: &'a Bucket) -> Result<Target<'a>, ConfigError> {
        match &bucket.origin {
            Origin::Calendar { calendar } => self
                .calendar_ids
                .get(calendar)
                .map(|id| Target::Calendar(id.clone()))
                .ok_or_else(|| ConfigError::MissingKey(format!("calendars.{calendar}"))),
            Origin::Collection { collection, .. } => self
                .collection_ids
                .get(collection)
                .map(|id| Target::Collection {
                    id: id.clone(),
                    origin: &bucket.origin,
                })
                .ok_or_else(|| ConfigError::MissingKey(format!("collections.{collection}"))),
        }
    }

    /// Fetch every bucket in `buckets` around `window`.
    pub async fn collect(
        &self,
        buckets: &[&Bucket],
        window: &TimeWindow,
    ) -> Result<Collected, ConfigError> {
        let targets = buckets
            .iter()
            .map(|bucket| self.resolve(bucket).map(|target| (*bucket, target)))
            .collect::<Result<Vec<_>, _>>()?;

        let padded = window.padded(self.padding_days);
        let fetches = targets
            .iter()
            .map(|(bucket, target)| self.fetch_bucket(bucket, target, padded));
        let outcomes = join_all(fetches).await;

        let mut collected = Collected::default();
        for ((bucket, _), outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(events) => {
                    debug!(bucket = %bucket.id, count = events.len(), "collected bucket");
                    collected.events.insert(bucket.id.clone(), events);
                }
                Err(e) => {
                    warn!(bucket = %bucket.id, error = %e, "bucket fetch failed");
                    collected.errors.push(BucketError {
                        bucket: bucket.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(collected)
    }

    async fn fetch_bucket(
        &self,
        bucket: &Bucket,
        target: &Target<'_>,
        padded: TimeWindow,
    ) -> Result<Vec<RawEvent>, SyncError> {
        match target {
            Target::Calendar(calendar_id) => {
                let events = self.calendars.list_events(calendar_id, &padded).await?;
                Ok(events
                    .iter()
                    .map(|event| {
                        let mut raw = RawEvent::from_calendar(&bucket.id, event);
                        if let Some(start) = raw.start_time {
                            raw.occurred_on = civil_date(&start, self.tz);
                        }
                        raw
                    })
                    .collect())
            }
            Target::Collection { id, origin } => {
                let Origin::Collection { date_property, .. } = origin else {
                    return Ok(Vec::new());
                };
                let filter = Filter::date_range(date_property, padded.start, padded.end);
                let records = self.destination.query(id, &filter).await?;
                Ok(records
                    .iter()
                    .filter_map(|record| self.record_to_event(bucket, record))
                    .collect())
            }
        }
    }

    /// Convert one collection record. Records without a usable date are dropped.
    ///
    /// A timestamp in the date property is a raw instant from the source, so
    /// the bucket's date rule applies to its civil date. Plain dates were
    /// already offset when the record was synced and are taken as is.
    pub fn record_to_event(&self, bucket: &Bucket, record: &Record) -> Option<RawEvent> {
        let Origin::Collection {
            date_property,
            title_property,
            hours_property,
            signal_properties,
            ..
        } = &bucket.origin
        else {
            return None;
        };

        let occurred_on = match record.get(date_property)? {
            PropertyValue::DateTime(dt) => {
                let local = civil_date(dt, self.tz);
                match bucket.source {
                    Some(kind) => kind.date_rule(self.tz).apply(RawDate::Date(local)),
                    None => local,
                }
            }
            other => match other.as_date() {
                Some(date) => date,
                None => {
                    debug!(record = %record.id, property = %date_property, "record has no date");
                    return None;
                }
            },
        };
        let label = record
            .get(title_property)
            .map(PropertyValue::to_plain)
            .unwrap_or_default();

        let mut event = RawEvent::on(&bucket.id, occurred_on, label);
        event.duration_hours = hours_property
            .as_deref()
            .and_then(|p| record.get(p))
            .and_then(PropertyValue::as_number);
        for property in signal_properties {
            if let Some(value) = record.get(property) {
                event = event.with_property(property.clone(), value.to_plain());
            }
        }
        Some(event)
    }
}
