//! Document metadata record and the [`Variant`] value type.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// A broken-down civil date and time (no time zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CivilDateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Civil date for a unix timestamp, interpreted as UTC.
    ///
    /// Returns `None` for timestamps outside the representable range.
    pub fn from_unix_timestamp(secs: i64) -> Option<Self> {
        let dt = DateTime::from_timestamp(secs, 0)?;
        Some(Self::from(dt.naive_utc()))
    }
}

impl From<NaiveDateTime> for CivilDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

impl std::fmt::Display for CivilDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// A metadata field value: string, unsigned number, date, or null.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Variant {
    #[default]
    Null,
    String(String),
    Unsigned(u64),
    Date(CivilDateTime),
}

impl Variant {
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// String rendering: strings as-is, numbers and dates converted, null empty.
    pub fn to_display_string(&self) -> String {
        match self {
            Variant::Null => String::new(),
            Variant::String(s) => s.clone(),
            Variant::Unsigned(n) => n.to_string(),
            Variant::Date(d) => d.to_string(),
        }
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl From<u64> for Variant {
    fn from(v: u64) -> Self {
        Variant::Unsigned(v)
    }
}

impl From<CivilDateTime> for Variant {
    fn from(v: CivilDateTime) -> Self {
        Variant::Date(v)
    }
}

/// Metadata extracted from a document.
///
/// Every field is optional; parsers fill what the format provides and leave
/// the rest unset. Format-specific fields go into `extra`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    pub author: Option<String>,
    pub creation_date: Option<CivilDateTime>,
    pub last_modified_by: Option<String>,
    pub last_modification_date: Option<CivilDateTime>,
    pub page_count: Option<u64>,
    pub word_count: Option<u64>,
    pub extra: BTreeMap<String, Variant>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }
}
