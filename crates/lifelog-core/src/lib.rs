//! # Lifelog Core Library
//!
//! This library turns time-stamped events from many personal data sources
//! into weekly and monthly recap records, and keeps those sources mirrored
//! into a destination store without ever creating a record twice. The
//! `lifelog` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Calendar**: Sunday-anchored week numbering, month-to-week derivation
//!   and per-source date offsets
//! - **Registry**: Declarative buckets, summary groups and routing rules
//! - **Aggregate**: Per-category day, session and hour totals plus detail text
//! - **Sync**: Fetch, transform, check and write with per-item error records
//! - **Recap**: Collect bucket events, aggregate, upsert the recap record
//! - **Storage**: TOML configuration and keyring-backed credentials
//!
//! ## Key Components
//!
//! - [`Registry`]: Validated source-to-category routing table
//! - [`Aggregator`]: Window aggregation over categorized events
//! - [`SyncOrchestrator`]: Idempotent sync runs
//! - [`RecapService`]: Week and month recaps
//! - [`Config`]: Application configuration management

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod events;
pub mod integrations;
pub mod recap;
pub mod registry;
pub mod sources;
pub mod storage;
pub mod sync;

pub use aggregate::{AggregateResult, Aggregator, CategoryTotals, MetricValue};
pub use calendar::{month_to_weeks, week_number_of, week_window, TimeWindow, WindowSelector};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use events::{RawEvent, SourceEvent};
pub use recap::{RecapReport, RecapService};
pub use registry::{Categorizer, Registry, SummaryGroup};
pub use storage::Config;
pub use sync::{SyncError, SyncOrchestrator, SyncRecord, SyncRunResult, SyncStatus};
