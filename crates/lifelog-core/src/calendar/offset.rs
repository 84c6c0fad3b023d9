//! Per-source date rules and wall-clock checks.
//!
//! Sources report dates in different conventions. The sleep tracker labels a
//! night by the morning the sleeper woke up; code hosting reports UTC
//! timestamps. Each source declares a [`DateOffsetRule`] that turns its raw
//! date into the civil date a recap should count.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Date as reported by a source, before any offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDate {
    /// A civil date with no time component.
    Date(NaiveDate),
    /// An absolute instant.
    Timestamp(DateTime<Utc>),
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        RawDate::Date(date)
    }
}

impl From<DateTime<Utc>> for RawDate {
    fn from(ts: DateTime<Utc>) -> Self {
        RawDate::Timestamp(ts)
    }
}

/// How a source's raw date maps to the reportable civil date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DateOffsetRule {
    /// Use the date as reported. Timestamps take their UTC date.
    Identity,
    /// The reported date is the wake-up morning; report the night before.
    NightOf,
    /// Convert timestamps into a fixed IANA zone before taking the date.
    CivilTimezone { tz: Tz },
}

impl DateOffsetRule {
    /// Apply the rule to a raw date.
    pub fn apply(&self, raw: RawDate) -> NaiveDate {
        match (self, raw) {
            (DateOffsetRule::Identity, RawDate::Date(d)) => d,
            (DateOffsetRule::Identity, RawDate::Timestamp(ts)) => ts.date_naive(),
            (DateOffsetRule::NightOf, RawDate::Date(d)) => d - Duration::days(1),
            (DateOffsetRule::NightOf, RawDate::Timestamp(ts)) => {
                ts.date_naive() - Duration::days(1)
            }
            (DateOffsetRule::CivilTimezone { .. }, RawDate::Date(d)) => d,
            (DateOffsetRule::CivilTimezone { tz }, RawDate::Timestamp(ts)) => {
                ts.with_timezone(tz).date_naive()
            }
        }
    }
}

/// Origins whose dates need source-specific handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SleepTracker,
    FitnessTracker,
    BodyScale,
    CodeHosting,
    Calendar,
    TaskDatabase,
}

impl SourceKind {
    /// Date rule for this source. `tz` is the civil zone reports are kept in.
    pub fn date_rule(&self, tz: Tz) -> DateOffsetRule {
        match self {
            SourceKind::SleepTracker => DateOffsetRule::NightOf,
            SourceKind::CodeHosting | SourceKind::BodyScale => {
                DateOffsetRule::CivilTimezone { tz }
            }
            SourceKind::FitnessTracker | SourceKind::Calendar | SourceKind::TaskDatabase => {
                DateOffsetRule::Identity
            }
        }
    }
}

/// Reportable date for `raw` coming from `source`.
pub fn source_date_offset(source: SourceKind, raw: impl Into<RawDate>, tz: Tz) -> NaiveDate {
    source.date_rule(tz).apply(raw.into())
}

/// Whether a wake-up happened after `threshold_hour:00`.
///
/// The wall-clock time is read in the timestamp's own offset, never in the
/// process's local zone, so a wake at 06:30-05:00 is early regardless of
/// where the sync runs.
pub fn is_late_wake(wake: &DateTime<FixedOffset>, threshold_hour: u32) -> bool {
    (wake.hour(), wake.minute()) > (threshold_hour.min(23), 0)
}

/// Civil date of an instant in `tz`.
pub fn civil_date<T: TimeZone>(ts: &DateTime<T>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn sleep_dates_are_shifted_to_the_night_of() {
        assert_eq!(
            source_date_offset(SourceKind::SleepTracker, date(2024, 1, 15), New_York),
            date(2024, 1, 14)
        );
        assert_eq!(
            source_date_offset(SourceKind::SleepTracker, date(2024, 3, 1), New_York),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn commit_timestamps_use_the_civil_zone() {
        // 03:30 UTC on Jan 15 is still the evening of Jan 14 in New York.
        assert_eq!(
            source_date_offset(SourceKind::CodeHosting, utc("2024-01-15T03:30:00Z"), New_York),
            date(2024, 1, 14)
        );
    }

    #[test]
    fn civil_zone_follows_daylight_saving() {
        // Summer: UTC-4, so 03:30 UTC is 23:30 the previous day.
        assert_eq!(
            DateOffsetRule::CivilTimezone { tz: New_York }.apply(utc("2024-07-10T03:30:00Z").into()),
            date(2024, 7, 9)
        );
        // Winter: UTC-5, 04:30 UTC is 23:30 the previous day.
        assert_eq!(
            DateOffsetRule::CivilTimezone { tz: New_York }.apply(utc("2024-01-10T04:30:00Z").into()),
            date(2024, 1, 9)
        );
        // 04:30 UTC in summer is already 00:30 local.
        assert_eq!(
            DateOffsetRule::CivilTimezone { tz: New_York }.apply(utc("2024-07-10T04:30:00Z").into()),
            date(2024, 7, 10)
        );
    }

    #[test]
    fn identity_keeps_dates() {
        assert_eq!(
            source_date_offset(SourceKind::FitnessTracker, date(2024, 5, 5), New_York),
            date(2024, 5, 5)
        );
    }

    #[test]
    fn late_wake_uses_the_timestamps_own_offset() {
        let early = DateTime::parse_from_rfc3339("2025-01-05T06:30:00-05:00").unwrap();
        let late = DateTime::parse_from_rfc3339("2025-01-05T07:30:00-05:00").unwrap();
        assert!(!is_late_wake(&early, 7));
        assert!(is_late_wake(&late, 7));
    }

    #[test]
    fn late_wake_boundary_is_exclusive() {
        let on_the_hour = DateTime::parse_from_rfc3339("2025-01-05T07:00:59+01:00").unwrap();
        let one_past = DateTime::parse_from_rfc3339("2025-01-05T07:01:00+01:00").unwrap();
        assert!(!is_late_wake(&on_the_hour, 7));
        assert!(is_late_wake(&one_past, 7));
    }

    #[test]
    fn date_rule_serializes_as_tagged_union() {
        let rule = DateOffsetRule::CivilTimezone { tz: New_York };
        let json = serde_json::to_value(rule).unwrap();
        assert_eq!(json["rule"], "civil_timezone");
        assert_eq!(json["tz"], "America/New_York");
    }
}
