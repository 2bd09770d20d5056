//! Time handling for the SNCF Navitia API.
//!
//! Navitia provides absolute instants as compact `YYYYMMDDTHHMMSS` strings
//! and stop times as `HHMMSS` strings. Both are local wall-clock times; no
//! timezone conversion is performed, so everything here works on
//! [`NaiveDateTime`].

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Placeholder shown when an instant is missing.
pub const TIME_PLACEHOLDER: &str = "--:--";

/// Length of a compact `YYYYMMDDTHHMMSS` timestamp.
const COMPACT_LEN: usize = 15;

/// Length of a `HHMMSS` clock time.
const CLOCK_LEN: usize = 6;

/// Threshold for detecting midnight rollover in stop time sequences.
///
/// If a time appears more than 6 hours before the previous time in the
/// sequence, we assume it has rolled over to the next day.
const ROLLOVER_THRESHOLD_HOURS: i64 = 6;

/// Parse a compact `YYYYMMDDTHHMMSS` timestamp.
///
/// Returns `None` for empty, malformed, or out-of-range input.
///
/// # Examples
///
/// ```
/// use departures_server::domain::{format_display_time, parse_compact_datetime};
///
/// let instant = parse_compact_datetime("20240315T143000");
/// assert_eq!(format_display_time(instant), "14:30");
///
/// assert!(parse_compact_datetime("").is_none());
/// assert!(parse_compact_datetime("20241315T143000").is_none());
/// assert!(parse_compact_datetime("2024-03-15 14:30").is_none());
/// ```
pub fn parse_compact_datetime(s: &str) -> Option<NaiveDateTime> {
    let bytes = s.as_bytes();
    if bytes.len() != COMPACT_LEN || bytes[8] != b'T' {
        return None;
    }

    let year = parse_digits(&bytes[0..4])?;
    let month = parse_digits(&bytes[4..6])?;
    let day = parse_digits(&bytes[6..8])?;
    let time = parse_hhmmss(&bytes[9..15])?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    Some(date.and_time(time))
}

/// Format an instant in the compact `YYYYMMDDTHHMMSS` form used by Navitia
/// query parameters.
pub fn format_compact_datetime(instant: NaiveDateTime) -> String {
    instant.format("%Y%m%dT%H%M%S").to_string()
}

/// Parse a `HHMMSS` clock time onto `base_date`.
///
/// Returns `None` if the string is empty or malformed. The result is always
/// on `base_date`; use [`ClockSequence`] for itineraries that may cross
/// midnight.
///
/// # Examples
///
/// ```
/// use departures_server::domain::parse_clock_time;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let t = parse_clock_time("091500", date).unwrap();
/// assert_eq!(t, date.and_hms_opt(9, 15, 0).unwrap());
///
/// assert!(parse_clock_time("", date).is_none());
/// assert!(parse_clock_time("256000", date).is_none());
/// ```
pub fn parse_clock_time(s: &str, base_date: NaiveDate) -> Option<NaiveDateTime> {
    let bytes = s.as_bytes();
    if bytes.len() != CLOCK_LEN {
        return None;
    }
    let time = parse_hhmmss(bytes)?;
    Some(base_date.and_time(time))
}

/// Render an instant as `HH:MM`, or `--:--` when absent.
pub fn format_display_time(instant: Option<NaiveDateTime>) -> String {
    match instant {
        Some(t) => format!("{:02}:{:02}", t.hour(), t.minute()),
        None => TIME_PLACEHOLDER.to_string(),
    }
}

/// Signed delay in whole minutes between a realtime and a scheduled instant.
///
/// Positive means late, negative early. Rounds to the nearest minute with
/// halves away from zero, so swapping the arguments negates the result.
///
/// # Examples
///
/// ```
/// use departures_server::domain::{delay_minutes, parse_compact_datetime};
///
/// let scheduled = parse_compact_datetime("20240315T090000");
/// let real = parse_compact_datetime("20240315T090700");
/// assert_eq!(delay_minutes(real, scheduled), Some(7));
/// assert_eq!(delay_minutes(scheduled, real), Some(-7));
/// assert_eq!(delay_minutes(None, scheduled), None);
/// ```
pub fn delay_minutes(real: Option<NaiveDateTime>, scheduled: Option<NaiveDateTime>) -> Option<i64> {
    let diff = real?.signed_duration_since(scheduled?);
    Some((diff.num_milliseconds() as f64 / 60_000.0).round() as i64)
}

/// Parses successive `HHMMSS` times of one itinerary, tracking the date.
///
/// Stop times come in itinerary order without a date. When a time appears
/// more than 6 hours earlier than the previous one, the service has crossed
/// midnight and the date advances.
///
/// # Examples
///
/// ```
/// use departures_server::domain::ClockSequence;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let mut seq = ClockSequence::new(date);
///
/// assert_eq!(seq.parse_next("233000").unwrap().date(), date);
/// let next_day = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
/// assert_eq!(seq.parse_next("001500").unwrap().date(), next_day);
/// assert_eq!(seq.parse_next("010000").unwrap().date(), next_day);
/// ```
#[derive(Debug, Clone)]
pub struct ClockSequence {
    current_date: NaiveDate,
    prev: Option<NaiveTime>,
}

impl ClockSequence {
    /// Start a sequence on `base_date`.
    pub fn new(base_date: NaiveDate) -> Self {
        Self {
            current_date: base_date,
            prev: None,
        }
    }

    /// Parse the next time in the sequence.
    ///
    /// Malformed input yields `None` and leaves the sequence untouched.
    pub fn parse_next(&mut self, s: &str) -> Option<NaiveDateTime> {
        let time = parse_clock_time(s, self.current_date)?.time();

        if let Some(prev) = self.prev {
            let diff = time.signed_duration_since(prev);
            if diff < -Duration::hours(ROLLOVER_THRESHOLD_HOURS) {
                self.current_date = self.current_date.succ_opt()?;
            }
        }

        self.prev = Some(time);
        Some(self.current_date.and_time(time))
    }

    /// Parse an optional field, falling back to `fallback` when absent.
    pub fn parse_next_or(&mut self, s: Option<&str>, fallback: Option<&str>) -> Option<NaiveDateTime> {
        self.parse_next(s.or(fallback)?)
    }
}

/// Parse six ASCII digits as a time of day.
fn parse_hhmmss(bytes: &[u8]) -> Option<NaiveTime> {
    if bytes.len() != CLOCK_LEN {
        return None;
    }
    let hour = parse_digits(&bytes[0..2])?;
    let minute = parse_digits(&bytes[2..4])?;
    let second = parse_digits(&bytes[4..6])?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse a run of ASCII digits into a u32.
fn parse_digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        let d = (b as char).to_digit(10)?;
        acc.checked_mul(10)?.checked_add(d)
    })
}
