//! Raw and normalized trial records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::TrialDate;
use crate::enums::{DateKind, DurationStatus, Phase, SponsorClass, StudyType, TrialStatus};

/// Public study page on the registry website.
pub const STUDY_URL_PREFIX: &str = "https://clinicaltrials.gov/study/";

/// One study exactly as the registry returned it.
///
/// Never mutated. Kept only for audit and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look up a nested field by JSON pointer (e.g. `/protocolSection/statusModule`).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Trial identifier, if present and a string. For logging only.
    pub fn trial_id(&self) -> Option<&str> {
        self.pointer("/protocolSection/identificationModule/nctId")
            .and_then(Value::as_str)
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Elapsed time of a trial and how it was derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationResult {
    pub days: i64,
    /// `days / 30.44`, rounded to one decimal.
    pub months: f64,
    /// `days / 365.25`, rounded to two decimals.
    pub years: f64,
    pub status: DurationStatus,
}

/// Lead sponsor of a trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    /// `None` when the registry does not report a sponsor name.
    pub name: Option<String>,
    pub class: SponsorClass,
}

/// Outcome measures, each reduced to "measure" or "measure: description".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcomes {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

/// Planned or actual enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub count: u64,
    /// `None` when the registry does not say whether the count is actual.
    pub kind: Option<DateKind>,
}

/// Short digest of a posted results section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub outcome_measure_count: usize,
    /// Titles of the first few reported outcome measures.
    pub outcome_measure_titles: Vec<String>,
    pub has_adverse_events: bool,
}

/// Canonical, immutable form of one registry study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Unique trial identifier (NCT number).
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_summary: Option<String>,
    pub status: TrialStatus,
    pub phase: Phase,
    pub study_type: StudyType,
    pub conditions: Vec<String>,
    pub start_date: Option<TrialDate>,
    pub primary_completion_date: Option<TrialDate>,
    pub completion_date: Option<TrialDate>,
    /// Present only when a duration could be classified.
    pub duration: Option<DurationResult>,
    pub enrollment: Option<Enrollment>,
    pub outcomes: Outcomes,
    pub has_results: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsSummary>,
    pub sponsor: Sponsor,
    pub url: String,
}

impl TrialRecord {
    /// Duration status, `Unknown` when no duration was classified.
    pub fn duration_status(&self) -> DurationStatus {
        self.duration
            .as_ref()
            .map_or(DurationStatus::Unknown, |d| d.status)
    }

    /// Whether the trial has reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn study_url(id: &str) -> String {
        format!("{STUDY_URL_PREFIX}{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_pointer_lookup() {
        let raw = RawRecord::new(json!({
            "protocolSection": {"identificationModule": {"nctId": "NCT01234567"}}
        }));
        assert_eq!(raw.trial_id(), Some("NCT01234567"));
        assert!(raw.pointer("/resultsSection").is_none());
    }

    #[test]
    fn raw_record_serializes_transparently() {
        let raw = RawRecord::new(json!({"a": 1}));
        assert_eq!(serde_json::to_string(&raw).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn study_url_uses_registry_prefix() {
        assert_eq!(
            TrialRecord::study_url("NCT00000001"),
            "https://clinicaltrials.gov/study/NCT00000001"
        );
    }
}
