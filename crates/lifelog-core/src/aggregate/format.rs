//! Human-readable detail blocks.
//!
//! ```text
//! Mon:
//! Holiday (all day)
//! Dinner (8:00-9:30pm)
//!
//! Wed:
//! Brunch (11:30am-1:00pm)
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};

use crate::events::SourceEvent;

/// Maximum length of a text property in the destination store.
pub const TEXT_LIMIT: usize = 2000;

/// Appended to text cut at [`TEXT_LIMIT`].
pub const TRUNCATION_MARKER: &str = "... [truncated]";

fn clock(ts: &DateTime<FixedOffset>) -> (String, &'static str) {
    let hour = ts.hour();
    let suffix = if hour < 12 { "am" } else { "pm" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    (format!("{hour12}:{:02}", ts.minute()), suffix)
}

/// Compact range such as `8:00-9:00pm` or `11:30am-1:00pm`.
///
/// Each endpoint is read in its own offset. The am/pm suffix is written once
/// when both endpoints share it.
pub fn format_time_range(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> String {
    let (start_clock, start_suffix) = clock(start);
    let (end_clock, end_suffix) = clock(end);
    if start_suffix == end_suffix {
        format!("{start_clock}-{end_clock}{end_suffix}")
    } else {
        format!("{start_clock}{start_suffix}-{end_clock}{end_suffix}")
    }
}

fn describe(event: &SourceEvent) -> String {
    if event.is_all_day {
        return format!("{} (all day)", event.label);
    }
    match (&event.start_time, &event.end_time) {
        (Some(start), Some(end)) => format!("{} ({})", event.label, format_time_range(start, end)),
        (Some(start), None) => {
            let (clock, suffix) = clock(start);
            format!("{} ({clock}{suffix})", event.label)
        }
        _ => event.label.clone(),
    }
}

/// Render events as per-day blocks, days in date order.
///
/// Within a day all-day events come first, then timed events by start time.
pub fn format_detail_blocks(events: &[&SourceEvent]) -> String {
    let mut sorted: Vec<&SourceEvent> = events.to_vec();
    sorted.sort_by(|a, b| {
        a.occurred_on
            .cmp(&b.occurred_on)
            .then_with(|| b.is_all_day.cmp(&a.is_all_day))
            .then_with(|| a.start_time.is_none().cmp(&b.start_time.is_none()))
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.label.cmp(&b.label))
    });

    let mut blocks: Vec<String> = Vec::new();
    let mut current: Option<NaiveDate> = None;
    for event in sorted {
        if current != Some(event.occurred_on) {
            current = Some(event.occurred_on);
            blocks.push(format!("{}:", event.occurred_on.format("%a")));
        }
        if let Some(block) = blocks.last_mut() {
            block.push('\n');
            block.push_str(&describe(event));
        }
    }
    blocks.join("\n\n")
}

/// Cut `text` to at most `limit` characters, ending with [`TRUNCATION_MARKER`].
///
/// A limit shorter than the marker keeps only as much of the marker as fits.
pub fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if limit < marker_len {
        return TRUNCATION_MARKER.chars().take(limit).collect();
    }
    let mut out: String = text.chars().take(limit - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn timed(date: &str, label: &str, start: &str, end: &str) -> SourceEvent {
        SourceEvent {
            category: "social".into(),
            occurred_on: date.parse().unwrap(),
            duration_hours: None,
            label: label.into(),
            is_all_day: false,
            start_time: Some(ts(start)),
            end_time: Some(ts(end)),
        }
    }

    fn all_day(date: &str, label: &str) -> SourceEvent {
        SourceEvent {
            category: "social".into(),
            occurred_on: date.parse().unwrap(),
            duration_hours: None,
            label: label.into(),
            is_all_day: true,
            start_time: None,
            end_time: None,
        }
    }

    #[test]
    fn shared_suffix_is_collapsed() {
        let range = format_time_range(
            &ts("2024-03-04T20:00:00-05:00"),
            &ts("2024-03-04T21:00:00-05:00"),
        );
        assert_eq!(range, "8:00-9:00pm");
    }

    #[test]
    fn differing_suffixes_are_both_written() {
        let range = format_time_range(
            &ts("2024-03-04T11:30:00-05:00"),
            &ts("2024-03-04T13:00:00-05:00"),
        );
        assert_eq!(range, "11:30am-1:00pm");
    }

    #[test]
    fn midnight_and_noon() {
        let range = format_time_range(
            &ts("2024-03-04T00:15:00+00:00"),
            &ts("2024-03-04T12:00:00+00:00"),
        );
        assert_eq!(range, "12:15am-12:00pm");
    }

    #[test]
    fn times_stay_in_their_own_offset() {
        let range = format_time_range(
            &ts("2024-03-04T20:00:00+09:00"),
            &ts("2024-03-04T22:00:00+09:00"),
        );
        assert_eq!(range, "8:00-10:00pm");
    }

    #[test]
    fn blocks_group_by_day_with_all_day_first() {
        let dinner = timed(
            "2024-03-04",
            "Dinner",
            "2024-03-04T20:00:00-05:00",
            "2024-03-04T21:30:00-05:00",
        );
        let lunch = timed(
            "2024-03-04",
            "Lunch",
            "2024-03-04T12:00:00-05:00",
            "2024-03-04T13:00:00-05:00",
        );
        let holiday = all_day("2024-03-04", "Holiday");
        let brunch = timed(
            "2024-03-06",
            "Brunch",
            "2024-03-06T11:30:00-05:00",
            "2024-03-06T13:00:00-05:00",
        );

        let text = format_detail_blocks(&[&brunch, &dinner, &lunch, &holiday]);
        assert_eq!(
            text,
            "Mon:\nHoliday (all day)\nLunch (12:00-1:00pm)\nDinner (8:00-9:30pm)\n\nWed:\nBrunch (11:30am-1:00pm)"
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(format_detail_blocks(&[]), "");
    }

    #[test]
    fn truncation_keeps_the_limit() {
        let long = "x".repeat(TEXT_LIMIT + 50);
        let cut = truncate_text(&long, TEXT_LIMIT);
        assert_eq!(cut.chars().count(), TEXT_LIMIT);
        assert!(cut.ends_with(TRUNCATION_MARKER));

        assert_eq!(truncate_text("short", TEXT_LIMIT), "short");
    }

    #[test]
    fn limit_shorter_than_marker_is_never_exceeded() {
        let long = "x".repeat(40);
        for limit in 0..TRUNCATION_MARKER.len() {
            assert_eq!(truncate_text(&long, limit).chars().count(), limit);
        }
        assert_eq!(truncate_text(&long, 3), "...");
        assert_eq!(truncate_text(&long, 0), "");
    }
}
