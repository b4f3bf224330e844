//! Availability summary.

use std::collections::BTreeMap;

use {receptionist_common::text::truncate_chars, receptionist_directory::SlotMap};

/// Upper bound on the summary length, in characters.
pub const MAX_SLOT_SUMMARY_CHARS: usize = 1500;

/// Number of start times that make an hour fully available (10-minute slots).
pub const FULL_HOUR_SLOTS: usize = 6;

/// Compress an availability map into one line per date and hour.
///
/// Dates and times are emitted in ascending order. An hour with
/// [`FULL_HOUR_SLOTS`] entries collapses into a single "fully available"
/// line; otherwise its times are listed. The result never exceeds
/// [`MAX_SLOT_SUMMARY_CHARS`] characters.
#[must_use]
pub fn format_slots(slots: &SlotMap) -> String {
    let mut lines = Vec::new();

    for (date, times) in slots {
        let mut by_hour: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for time in times {
            by_hour.entry(hour_key(time)).or_default().push(time);
        }

        for (hour, times) in by_hour {
            if times.len() == FULL_HOUR_SLOTS {
                lines.push(format!("{date}: {hour} is fully available."));
            } else {
                lines.push(format!("{date}: {hour}: {}", times.join(", ")));
            }
        }
    }

    truncate_chars(&lines.join("\n"), MAX_SLOT_SUMMARY_CHARS).to_string()
}

/// `"10:20"` → `"10:00"`. Times without a two-character hour are their own key.
fn hour_key(time: &str) -> String {
    match time.get(..2) {
        Some(hour) if hour.chars().all(|c| c.is_ascii_digit()) => format!("{hour}:00"),
        _ => time.to_string(),
    }
}
