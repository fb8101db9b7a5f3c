//! Canonical local-calendar date keys.
//!
//! Every conversion from a raw `published` value to a calendar date goes
//! through this module. Dates are always taken from the wall clock of the
//! target timezone, never from a UTC rendering of the instant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Date-time formats that carry their own UTC offset.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];

/// Date-time formats without an offset; their wall-clock date is used as is.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A calendar date (year, month, day) in some local timezone.
///
/// Ordering is chronological: fields compare lexicographically in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DateKey {
    year: i32,
    month: u32,
    day: u32,
}

impl DateKey {
    /// Builds a key from its components, rejecting dates that do not exist.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_naive)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        DateKey {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Parses `ts` and returns its date in the host's local timezone.
    pub fn from_timestamp(ts: &str) -> Result<Self> {
        Self::from_timestamp_in(ts, &Local)
    }

    /// Parses `ts` and returns its date as seen on a wall clock in `tz`.
    pub fn from_timestamp_in<Tz: TimeZone>(ts: &str, tz: &Tz) -> Result<Self> {
        local_datetime_in(ts, tz)
            .map(|local| Self::from_naive(local.date()))
            .ok_or_else(|| CalendarError::InvalidTimestamp { raw: ts.to_string() })
    }

    /// Parses the zero-padded `YYYY-MM-DD` storage form.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        let bytes = key.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        NaiveDate::parse_from_str(key, "%Y-%m-%d")
            .ok()
            .map(Self::from_naive)
    }

    /// Today's date in the host's local timezone.
    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive())
    }

    /// Today's date in `tz`.
    pub fn today_in<Tz: TimeZone>(tz: &Tz) -> Self {
        Self::from_naive(Utc::now().with_timezone(tz).date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Renders the Japanese display label, e.g. `2025年10月3日`.
    pub fn to_display_string(&self) -> String {
        format!("{}年{}月{}日", self.year, self.month, self.day)
    }

    /// Renders the `YYYY-MM-DD` storage key used for lookups and cell ids.
    pub fn to_storage_key(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for DateKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DateKey::from_storage_key(s).ok_or_else(|| format!("Invalid storage key: {}", s))
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_storage_key()
    }
}

impl TryFrom<String> for DateKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// A calendar month, the unit the month grid is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| YearMonth { year, month })
    }

    /// The month `key` falls in.
    pub fn of(key: &DateKey) -> Self {
        YearMonth {
            year: key.year,
            month: key.month,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The preceding month, rolling January back into December.
    ///
    /// Stays put at the earliest representable month.
    pub fn previous(&self) -> Self {
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        YearMonth::new(year, month).unwrap_or(*self)
    }

    /// The following month, rolling December into January.
    ///
    /// Stays put at the latest representable month.
    pub fn next(&self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        YearMonth::new(year, month).unwrap_or(*self)
    }

    /// Number of days, taken as day 0 of the following month.
    pub fn days_in_month(&self) -> u32 {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.pred_opt())
            .map_or(31, |last| last.day())
    }

    /// Blank cells before day 1 in a Sunday-first week.
    pub fn first_weekday_offset(&self) -> u32 {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map_or(0, |first| first.weekday().num_days_from_sunday())
    }

    /// The key for `day` of this month, if that day exists.
    pub fn day(&self, day: u32) -> Option<DateKey> {
        DateKey::new(self.year, self.month, day)
    }

    pub fn contains(&self, key: &DateKey) -> bool {
        key.year == self.year && key.month == self.month
    }

    /// Renders the Japanese month heading, e.g. `2025年10月`.
    pub fn to_display_string(&self) -> String {
        format!("{}年{}月", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("Invalid month: {}", s);
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl From<YearMonth> for String {
    fn from(month: YearMonth) -> Self {
        month.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parses a timestamp in any of the accepted forms and returns the wall-clock
/// date and time it corresponds to in `tz`.
///
/// Bare dates resolve to midnight of that date. Values without an offset are
/// taken to already be wall-clock time in `tz`.
pub fn local_datetime_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(instant) = parse_instant(raw) {
        return Some(instant.with_timezone(tz).naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parses a timestamp that pins an absolute instant.
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    // RSS `pubDate`, e.g. "Fri, 03 Oct 2025 08:30:00 +0900"
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|date| date.with_timezone(&Utc))
}
