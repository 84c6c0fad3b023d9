//! Recap pipeline: collect bucket events, aggregate them over a week or a
//! month, and upsert the result as one record in the destination store.

pub mod collector;
pub mod months;
pub mod service;
pub mod writer;

pub use collector::{BucketError, Collected, EventCollector};
pub use months::{MonthWeekResolver, MonthWeeks, WeekSource, WEEKS_RELATION_PROPERTY};
pub use service::{RecapReport, RecapService};
pub use writer::{
    RecapAction, RecapWriter, WrittenRecap, RECAP_DATE_PROPERTY, RECAP_TITLE_PROPERTY,
};
