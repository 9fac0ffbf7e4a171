//! Creation-time parsing for event values.

use crate::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use proctree::record::TIME_DISPLAY_FORMAT;
use regex::Regex;

lazy_static! {
    static ref EPOCH_SECONDS_REGEX: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
}

/// A time value as read from an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTime {
    /// Text shown in rendered output
    pub display: String,
    /// Sortable time, when the value could be understood
    pub time: Option<NaiveDateTime>,
}

impl ParsedTime {
    fn parsed(time: NaiveDateTime) -> Self {
        Self {
            display: time.format(TIME_DISPLAY_FORMAT).to_string(),
            time: Some(time),
        }
    }

    fn unparsed(display: &str) -> Self {
        Self {
            display: display.to_string(),
            time: None,
        }
    }
}

fn from_epoch_seconds(value: &str) -> Option<NaiveDateTime> {
    if !EPOCH_SECONDS_REGEX.is_match(value) {
        return None;
    }
    let seconds: f64 = value.parse().ok()?;
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|time| time.naive_utc())
}

/// Parse a raw time value.
///
/// With `format`, the value must match it. Without one, epoch seconds (integer or decimal, UTC)
/// and RFC 3339 are understood. Values that cannot be parsed keep their text for display but
/// stay unordered. Returns `None` for empty values.
pub fn parse_time(raw: &str, format: Option<&str>) -> Option<ParsedTime> {
    let value = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if value.is_empty() {
        return None;
    }

    let parsed = match format {
        Some(format) => NaiveDateTime::parse_from_str(value, format)
            .ok()
            .or_else(|| {
                // Date-only formats start at midnight
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            }),
        None => from_epoch_seconds(value).or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|time| time.naive_utc())
        }),
    };

    Some(match parsed {
        Some(time) => ParsedTime::parsed(time),
        None => {
            trace!("Keeping unparsed time value {value:?}");
            ParsedTime::unparsed(value)
        }
    })
}
