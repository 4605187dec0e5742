//! Record-level error types shared across crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A date field that could not be parsed at any precision.
///
/// Never fatal for a record: the date is treated as absent and duration
/// classification falls through to `UNKNOWN`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("could not parse {field} value '{value}' as a date")]
pub struct DateParseError {
    /// Record field the value came from (e.g. `startDate`).
    pub field: String,
    /// Raw source value.
    pub value: String,
}

impl DateParseError {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A record missing a required field, or with a structurally invalid one.
///
/// The caller skips the record and reports it; no default is substituted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("malformed record: {field} {reason}")]
pub struct MalformedRecord {
    /// JSON path of the offending field.
    pub field: String,
    pub reason: MalformedReason,
    /// Trial identifier when it could be read before the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_id: Option<String>,
}

/// Why a required field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MalformedReason {
    Missing,
    Empty,
    WrongType(String),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::Missing => write!(f, "is missing"),
            MalformedReason::Empty => write!(f, "is empty"),
            MalformedReason::WrongType(expected) => write!(f, "is not a {expected}"),
        }
    }
}

impl MalformedRecord {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: MalformedReason::Missing,
            trial_id: None,
        }
    }

    pub fn empty(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: MalformedReason::Empty,
            trial_id: None,
        }
    }

    pub fn wrong_type(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: MalformedReason::WrongType(expected.into()),
            trial_id: None,
        }
    }

    /// Attach the trial identifier for reporting.
    #[must_use]
    pub fn with_trial_id(mut self, id: impl Into<String>) -> Self {
        self.trial_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = MalformedRecord::missing("protocolSection.identificationModule.nctId");
        assert_eq!(
            err.to_string(),
            "malformed record: protocolSection.identificationModule.nctId is missing"
        );

        let err = MalformedRecord::wrong_type("briefTitle", "string");
        assert_eq!(err.to_string(), "malformed record: briefTitle is not a string");

        let err = DateParseError::new("startDate", "someday");
        assert_eq!(
            err.to_string(),
            "could not parse startDate value 'someday' as a date"
        );
    }
}
