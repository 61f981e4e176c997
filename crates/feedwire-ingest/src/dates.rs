//! Publication-date normalisation.
//!
//! Structured timestamps (RFC 2822, RFC 3339, ISO 8601 without offset) are
//! tried first. When the source has a configured zone, the wall-clock reading
//! is interpreted in that zone regardless of any offset the feed states: such
//! feeds write local time and label it UTC. Otherwise offsets are honoured
//! and naive timestamps are taken as UTC. The last resort is the textual
//! `30 August 2023 - 18:15` form, read in the source zone.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::EntryError;

const FALLBACK_FORMAT: &str = "%d %B %Y - %H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

enum Structured {
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse_structured(raw: &str) -> Option<Structured> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(Structured::Offset(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Structured::Offset(dt));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(Structured::Naive)
}

fn localize(naive: NaiveDateTime, zone: Tz, raw: &str) -> Result<DateTime<Utc>, EntryError> {
    // Ambiguous wall-clock times (the repeated autumn hour) resolve to the earlier instant.
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EntryError::NonexistentLocalTime {
            raw: raw.to_string(),
            zone: zone.name().to_string(),
        })
}

/// Normalise an entry's date text to UTC.
///
/// # Errors
///
/// [`EntryError::MissingDate`] when there is no date text,
/// [`EntryError::InvalidDate`] when no known format matches, and
/// [`EntryError::NonexistentLocalTime`] for a wall-clock time skipped by a
/// daylight-saving transition in the source zone.
pub fn parse_entry_date(raw: Option<&str>, zone: Option<Tz>) -> Result<DateTime<Utc>, EntryError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(EntryError::MissingDate)?;

    match (parse_structured(raw), zone) {
        (Some(Structured::Offset(dt)), None) => Ok(dt.with_timezone(&Utc)),
        (Some(Structured::Offset(dt)), Some(tz)) => localize(dt.naive_local(), tz, raw),
        (Some(Structured::Naive(naive)), zone) => localize(naive, zone.unwrap_or(Tz::UTC), raw),
        (None, zone) => {
            let naive = NaiveDateTime::parse_from_str(raw, FALLBACK_FORMAT)
                .map_err(|_| EntryError::InvalidDate(raw.to_string()))?;
            localize(naive, zone.unwrap_or(Tz::UTC), raw)
        }
    }
}
