//! Date ranges and parsing of provider date strings.
//!
//! Providers print publication dates in their own language and layout
//! (`"12. Januar 2014, 14:05"`, `"7:05PM GMT 12 Jan 2014"`). Before a string
//! is handed to `chrono` it is normalized: German month and weekday names are
//! replaced by their English counterparts and well-known timezone
//! abbreviations by numeric offsets, so that provider formats can be written
//! with `%B`, `%A` and `%z`. The dot of an abbreviation stays in place, so
//! `"5. Jan. 2014"` reads as `"%d. %B. %Y"`.

use crate::errors::{ConfigError, DateParseError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// An inclusive range of calendar days, interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ConfigError> {
        if from > to {
            return Err(ConfigError::InvalidDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.from
    }

    pub fn last_day(&self) -> NaiveDate {
        self.to
    }

    /// Whether `timestamp` falls on one of the days of the range.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        day >= self.from && day <= self.to
    }
}

/// Language a provider prints its dates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateLocale {
    #[default]
    English,
    German,
}

/// How a date string is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    /// A `chrono` format string, applied after locale normalization.
    Pattern(String),
    /// RFC 3339 / ISO 8601 with offset, e.g. `2014-01-05T12:00:00+01:00`.
    Rfc3339,
}

impl DateFormat {
    pub fn pattern(pattern: &str) -> Self {
        DateFormat::Pattern(pattern.to_string())
    }
}

static GERMAN_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("januar", "January"),
        ("jan", "January"),
        ("februar", "February"),
        ("feb", "February"),
        ("märz", "March"),
        ("mär", "March"),
        ("mrz", "March"),
        ("april", "April"),
        ("apr", "April"),
        ("mai", "May"),
        ("juni", "June"),
        ("jun", "June"),
        ("juli", "July"),
        ("jul", "July"),
        ("august", "August"),
        ("aug", "August"),
        ("september", "September"),
        ("sept", "September"),
        ("sep", "September"),
        ("oktober", "October"),
        ("okt", "October"),
        ("november", "November"),
        ("nov", "November"),
        ("dezember", "December"),
        ("dez", "December"),
        ("montag", "Monday"),
        ("mo", "Monday"),
        ("dienstag", "Tuesday"),
        ("di", "Tuesday"),
        ("mittwoch", "Wednesday"),
        ("mi", "Wednesday"),
        ("donnerstag", "Thursday"),
        ("do", "Thursday"),
        ("freitag", "Friday"),
        ("fr", "Friday"),
        ("samstag", "Saturday"),
        ("sonnabend", "Saturday"),
        ("sa", "Saturday"),
        ("sonntag", "Sunday"),
        ("so", "Sunday"),
    ])
});

// A run of letters plus the abbreviation dot that may follow it.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+\.?").expect("static regex"));

static TIMEZONES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("BST", "+0100"),
        ("CET", "+0100"),
        ("MEZ", "+0100"),
        ("CEST", "+0200"),
        ("MESZ", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
    ]
    .into_iter()
    .filter_map(|(name, offset)| {
        Regex::new(&format!(r"\b{name}\b"))
            .ok()
            .map(|re| (re, offset))
    })
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Rewrites a provider date string so that `chrono` can parse it.
pub fn normalize_date_text(input: &str, locale: DateLocale) -> String {
    let mut text = WHITESPACE.replace_all(input.trim(), " ").into_owned();

    if locale == DateLocale::German {
        text = WORD
            .replace_all(&text, |caps: &regex::Captures| {
                let word = &caps[0];
                let (name, dot) = match word.strip_suffix('.') {
                    Some(name) => (name, "."),
                    None => (word, ""),
                };
                match GERMAN_NAMES.get(name.to_lowercase().as_str()) {
                    Some(english) => format!("{english}{dot}"),
                    None => word.to_string(),
                }
            })
            .into_owned();
    }

    for (re, offset) in TIMEZONES.iter() {
        text = re.replace_all(&text, *offset).into_owned();
    }

    text
}

/// Parses a provider date string into a UTC timestamp.
///
/// Formats carrying an offset are converted to UTC. Formats without one are
/// read as UTC; formats without a time of day yield midnight.
pub fn parse_date(
    input: &str,
    format: &DateFormat,
    locale: DateLocale,
) -> Result<DateTime<Utc>, DateParseError> {
    let text = normalize_date_text(input, locale);

    match format {
        DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| date_error(input, "RFC 3339", e)),
        DateFormat::Pattern(pattern) => {
            if let Ok(dt) = DateTime::parse_from_str(&text, pattern) {
                return Ok(dt.with_timezone(&Utc));
            }
            match NaiveDateTime::parse_from_str(&text, pattern) {
                Ok(naive) => Ok(naive.and_utc()),
                Err(datetime_err) => NaiveDate::parse_from_str(&text, pattern)
                    .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                    .map_err(|_| date_error(input, pattern, datetime_err)),
            }
        }
    }
}

fn date_error(input: &str, format: &str, err: chrono::ParseError) -> DateParseError {
    DateParseError {
        input: input.to_string(),
        format: format.to_string(),
        reason: err.to_string(),
    }
}
