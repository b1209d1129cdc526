use chrono::{NaiveTime, Timelike};

use super::types::SlotConfig;

/// Start boundaries of the default teaching day
pub const DEFAULT_BOUNDARIES: [&str; 8] = [
    "09:00", "10:00", "11:00", "11:30", "12:30", "13:30", "14:30", "15:30",
];

/// End of the last default slot
pub const DEFAULT_DAY_END: &str = "16:30";

/// Parses a time of day in "HH:MM" or "HH:MM:SS" form
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    let format = match raw.len() {
        5 => "%H:%M",
        8 => "%H:%M:%S",
        _ => return None,
    };
    NaiveTime::parse_from_str(raw, format).ok()
}

/// Formats a time as the "HH:MM" slot key
pub fn slot_key(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Display range like "09:00 - 10:00"
pub fn format_label(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", slot_key(start), slot_key(end))
}

/// Drops seconds and below
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

pub fn same_minute(a: NaiveTime, b: NaiveTime) -> bool {
    a.hour() == b.hour() && a.minute() == b.minute()
}

/// The 09:00 to 16:30 day with its break and lunch slots
pub fn default_slots() -> SlotConfig {
    // Constants are ascending, so construction cannot fail.
    SlotConfig::from_boundaries(&DEFAULT_BOUNDARIES, DEFAULT_DAY_END)
        .unwrap_or_else(|e| panic!("default slot boundaries are invalid: {e}"))
}
