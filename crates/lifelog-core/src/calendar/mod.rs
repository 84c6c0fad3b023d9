//! Calendar arithmetic.
//!
//! Pure date math: Sunday-anchored week numbering, month-to-week derivation,
//! per-source date offsets and the window presets the CLI exposes.

pub mod event;
pub mod offset;
pub mod presets;
pub mod weeks;
pub mod window;

pub use event::{CalendarEvent, CalendarEventPayload, EventTime};
pub use offset::{civil_date, is_late_wake, source_date_offset, DateOffsetRule, RawDate, SourceKind};
pub use presets::{Period, ResolvedWindow, WindowSelector};
pub use weeks::{month_to_weeks, sunday_on_or_before, week_number_of, week_one_sunday, week_window};
pub use window::TimeWindow;
