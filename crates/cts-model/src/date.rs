//! Registry dates with partial precision.
//!
//! Registry dates come as `YYYY-MM-DD`, `YYYY-MM` or `YYYY`. Parsing keeps the
//! precision actually present in the source. Partial dates are anchored to
//! the first day of their period so that they can be subtracted.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::DateKind;
use crate::error::DateParseError;

/// Finest unit of a source date that was actually available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A registry date reduced to its best available precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDate {
    /// Calendar date; for `Month`/`Year` precision, the first day of the period.
    pub value: NaiveDate,
    pub precision: DatePrecision,
    pub kind: DateKind,
}

impl TrialDate {
    pub fn new(value: NaiveDate, precision: DatePrecision, kind: DateKind) -> Self {
        let value = anchor(value, precision);
        Self {
            value,
            precision,
            kind,
        }
    }

    /// Parse a registry date string at the best available precision.
    ///
    /// `field` names the record field and is carried in the error.
    pub fn parse(field: &str, raw: &str, kind: DateKind) -> Result<Self, DateParseError> {
        let (value, precision) =
            parse_partial_date(raw).ok_or_else(|| DateParseError::new(field, raw))?;
        Ok(Self {
            value,
            precision,
            kind,
        })
    }

    pub fn is_estimated(&self) -> bool {
        self.kind == DateKind::Estimated
    }
}

impl fmt::Display for TrialDate {
    /// Formats with the original precision (`2020`, `2020-03`, `2020-03-15`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DatePrecision::Day => write!(f, "{}", self.value.format("%Y-%m-%d")),
            DatePrecision::Month => write!(f, "{:04}-{:02}", self.value.year(), self.value.month()),
            DatePrecision::Year => write!(f, "{:04}", self.value.year()),
        }
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM` or `YYYY`, trying the finest format first.
///
/// Returns the anchored date together with the precision achieved.
pub fn parse_partial_date(raw: &str) -> Option<(NaiveDate, DatePrecision)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some((date, DatePrecision::Day));
    }

    // YYYY-MM
    if trimmed.len() == 7 && trimmed.as_bytes().get(4) == Some(&b'-') {
        if let (Ok(year), Ok(month)) = (trimmed[0..4].parse::<i32>(), trimmed[5..7].parse::<u32>())
        {
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| (d, DatePrecision::Month));
        }
    }

    // YYYY
    if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(year) = trimmed.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| (d, DatePrecision::Year));
        }
    }

    None
}

fn anchor(value: NaiveDate, precision: DatePrecision) -> NaiveDate {
    let anchored = match precision {
        DatePrecision::Day => Some(value),
        DatePrecision::Month => value.with_day(1),
        DatePrecision::Year => NaiveDate::from_ymd_opt(value.year(), 1, 1),
    };
    anchored.unwrap_or(value)
}
