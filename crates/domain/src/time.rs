//! Time and timestamp helpers.
//!
//! The remote service exchanges instants as ISO 8601 strings. Scheduling
//! forms collect a date and a time separately; they are read as wall-clock
//! time in the dashboard's display offset and sent as a UTC instant.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat,
    TimeZone, Utc,
};

use crate::error::ValidationError;

/// UTC timestamp used for sync times, scheduled instants, etc.
pub type Timestamp = DateTime<Utc>;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// The offset of the machine's local time zone right now.
#[must_use]
pub fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// Combine separate `YYYY-MM-DD` and `HH:MM` inputs into an absolute instant.
///
/// The inputs are read as wall-clock time in `offset`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] for blank inputs,
/// [`ValidationError::InvalidDate`] / [`ValidationError::InvalidTime`] when
/// they do not parse, and [`ValidationError::NonexistentLocalTime`] when the
/// wall time cannot be mapped to an instant.
pub fn combine_date_time(
    date: &str,
    time: &str,
    offset: &FixedOffset,
) -> Result<Timestamp, ValidationError> {
    let date = date.trim();
    let time = time.trim();
    if date.is_empty() {
        return Err(ValidationError::MissingField("date"));
    }
    if time.is_empty() {
        return Err(ValidationError::MissingField("time"));
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
    let clock = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))?;

    let wall = NaiveDateTime::new(day, clock);
    offset
        .from_local_datetime(&wall)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::NonexistentLocalTime {
            wall_time: format!("{date}T{time}"),
        })
}

/// Render an instant the way the remote service expects it
/// (`2025-01-01T07:00:00.000Z`).
#[must_use]
pub fn to_iso(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an instant delivered by the server.
///
/// Accepts RFC 3339 and offset-less ISO strings; the latter are read as
/// wall-clock time in `offset`.
#[must_use]
pub fn parse_instant(raw: &str, offset: &FixedOffset) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a server-provided instant in `offset`, or return it untouched when
/// it cannot be parsed.
#[must_use]
pub fn format_for_display(raw: &str, offset: &FixedOffset) -> String {
    parse_instant(raw, offset).map_or_else(
        || raw.to_string(),
        |ts| ts.with_timezone(offset).format(DISPLAY_FORMAT).to_string(),
    )
}
