//! Idempotent synchronization.
//!
//! A run moves one source's items through fetch, transform, existence check
//! and write. Items are written sequentially with a fixed pause before every
//! external call; failures are recorded per item and never abort the run.

pub mod backoff;
pub mod filter;
pub mod item;
pub mod memory;
pub mod orchestrator;
pub mod ports;
pub mod properties;
pub mod run;
pub mod sinks;
pub mod types;

#[cfg(test)]
mod orchestrator_tests;
#[cfg(test)]
mod run_tests;

pub use backoff::Backoff;
pub use filter::Filter;
pub use item::{ItemPayload, NaturalKey, SyncItem};
pub use memory::MemoryStore;
pub use orchestrator::{SyncJob, SyncOrchestrator};
pub use ports::{CalendarStore, DestinationStore, RawFeed, SyncSink, SyncSource};
pub use properties::{Properties, PropertyValue, Record};
pub use run::SyncRun;
pub use sinks::{CalendarSink, CollectionSink, DryRunSink, CALENDAR_KEY_PROPERTY};
pub use types::{RunState, SyncError, SyncRecord, SyncRunResult, SyncStatus};
