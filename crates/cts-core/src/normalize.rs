//! Raw registry study to [`TrialRecord`].
//!
//! Required fields are the study identifier and a title. Everything else is
//! optional: absent categorical fields become `Unknown`, absent dates become
//! `None`, and values that are present but unusable are reported as
//! [`RecordWarning`]s alongside the record.

use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::Value;

use cts_model::{
    AggregateWarning, DateKind, DateParseError, Enrollment, MalformedRecord, Outcomes, Phase,
    RawRecord, ResultsSummary, Sponsor, SponsorClass, StudyType, TrialDate, TrialRecord,
    TrialStatus,
};

use crate::duration::compute_duration;
use crate::field::{
    Field, array_at, bool_at, dotted, lookup, object_at, str_at, strings_at, text_at, u64_at,
};

const PROTOCOL: &str = "protocolSection";
const NCT_ID: &[&str] = &[PROTOCOL, "identificationModule", "nctId"];
const BRIEF_TITLE: &[&str] = &[PROTOCOL, "identificationModule", "briefTitle"];
const OFFICIAL_TITLE: &[&str] = &[PROTOCOL, "identificationModule", "officialTitle"];
const OVERALL_STATUS: &[&str] = &[PROTOCOL, "statusModule", "overallStatus"];
const PHASES: &[&str] = &[PROTOCOL, "designModule", "phases"];
const STUDY_TYPE: &[&str] = &[PROTOCOL, "designModule", "studyType"];
const ENROLLMENT_COUNT: &[&str] = &[PROTOCOL, "designModule", "enrollmentInfo", "count"];
const ENROLLMENT_TYPE: &[&str] = &[PROTOCOL, "designModule", "enrollmentInfo", "type"];
const CONDITIONS: &[&str] = &[PROTOCOL, "conditionsModule", "conditions"];
const BRIEF_SUMMARY: &[&str] = &[PROTOCOL, "descriptionModule", "briefSummary"];
const PRIMARY_OUTCOMES: &[&str] = &[PROTOCOL, "outcomesModule", "primaryOutcomes"];
const SECONDARY_OUTCOMES: &[&str] = &[PROTOCOL, "outcomesModule", "secondaryOutcomes"];
const SPONSOR_NAME: &[&str] = &[PROTOCOL, "sponsorCollaboratorsModule", "leadSponsor", "name"];
const SPONSOR_CLASS: &[&str] = &[PROTOCOL, "sponsorCollaboratorsModule", "leadSponsor", "class"];
const HAS_RESULTS: &[&str] = &["hasResults"];
const RESULTS_SECTION: &[&str] = &["resultsSection"];
const OUTCOME_MEASURES: &[&str] = &["outcomeMeasuresModule", "outcomeMeasures"];
const ADVERSE_EVENTS: &[&str] = &["adverseEventsModule"];

/// Outcome-measure titles kept in a [`ResultsSummary`].
pub const RESULT_TITLES_KEPT: usize = 5;

/// A non-fatal data-quality problem found while normalizing one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWarning {
    /// A date was present but unparseable; it was treated as absent.
    DateParse(DateParseError),
    /// Completion precedes start.
    NegativeDuration { days: i64 },
    /// A categorical value outside the known set; recorded as `Unknown`.
    UnrecognizedValue { field: String, value: String },
}

impl RecordWarning {
    /// Attach the trial identifier for reporting on an aggregate.
    pub fn into_aggregate(self, trial_id: &str) -> AggregateWarning {
        let trial_id = trial_id.to_string();
        match self {
            RecordWarning::DateParse(error) => AggregateWarning::DateParse { trial_id, error },
            RecordWarning::NegativeDuration { days } => {
                AggregateWarning::NegativeDuration { trial_id, days }
            }
            RecordWarning::UnrecognizedValue { field, value } => AggregateWarning::UnrecognizedValue {
                trial_id,
                field,
                value,
            },
        }
    }
}

/// A normalized record and the warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: TrialRecord,
    pub warnings: Vec<RecordWarning>,
}

impl Normalized {
    /// Warnings tagged with this record's identifier.
    pub fn aggregate_warnings(&self) -> impl Iterator<Item = AggregateWarning> + '_ {
        self.warnings
            .iter()
            .cloned()
            .map(|w| w.into_aggregate(&self.record.id))
    }
}

/// Maps raw registry studies to canonical records.
///
/// `today` is the reference date for ongoing durations.
#[derive(Debug, Clone, Copy)]
pub struct RecordNormalizer {
    today: NaiveDate,
}

impl RecordNormalizer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<Normalized, MalformedRecord> {
        let root = raw.value();
        match object_at(root, &[PROTOCOL]) {
            Field::Present(_) => {}
            Field::Missing => return Err(MalformedRecord::missing(PROTOCOL)),
            Field::Malformed { expected } => {
                return Err(MalformedRecord::wrong_type(PROTOCOL, expected));
            }
        }

        let id = required_text(root, NCT_ID)?.to_string();
        let official_title = text_at(root, OFFICIAL_TITLE).ok().map(str::to_string);
        let title = match text_at(root, BRIEF_TITLE) {
            Field::Present(title) => title.trim().to_string(),
            Field::Missing => official_title
                .clone()
                .ok_or_else(|| MalformedRecord::missing(dotted(BRIEF_TITLE)).with_trial_id(&id))?,
            Field::Malformed { expected } => {
                return Err(MalformedRecord::wrong_type(dotted(BRIEF_TITLE), expected)
                    .with_trial_id(&id));
            }
        };

        let mut warnings = Vec::new();

        let status = categorical(root, OVERALL_STATUS, TrialStatus::Unknown, &mut warnings);
        let study_type = categorical(root, STUDY_TYPE, StudyType::Unknown, &mut warnings);
        let phase = phase_of(root, &mut warnings);

        let start = trial_date(root, "startDateStruct", &mut warnings);
        let primary_completion = trial_date(root, "primaryCompletionDateStruct", &mut warnings);
        let completion = trial_date(root, "completionDateStruct", &mut warnings);
        // An unreadable date is not an absent one: classify nothing from it.
        let dates_malformed = [&start, &primary_completion, &completion]
            .into_iter()
            .any(Field::is_malformed);
        let (start_date, primary_completion_date, completion_date) =
            (start.ok(), primary_completion.ok(), completion.ok());

        let duration = if dates_malformed {
            None
        } else {
            compute_duration(
                start_date.as_ref(),
                primary_completion_date.as_ref(),
                completion_date.as_ref(),
                status,
                self.today,
            )
        };
        if let Some(d) = duration.filter(|d| d.days < 0) {
            warnings.push(RecordWarning::NegativeDuration { days: d.days });
        }

        let count = u64_at(root, ENROLLMENT_COUNT);
        let enrollment =
            reported(root, count, ENROLLMENT_COUNT, &mut warnings).map(|count| Enrollment {
                count,
                kind: optional_kind(root, ENROLLMENT_TYPE, &mut warnings),
            });

        let results_section = lookup(root, RESULTS_SECTION)
            .ok()
            .filter(|section| section.as_object().is_some_and(|m| !m.is_empty()));
        let has_results = reported(root, bool_at(root, HAS_RESULTS), HAS_RESULTS, &mut warnings)
            .unwrap_or(results_section.is_some());
        let results = results_section.map(results_summary);

        let sponsor = Sponsor {
            name: text_at(root, SPONSOR_NAME).ok().map(str::to_string),
            class: categorical(root, SPONSOR_CLASS, SponsorClass::Unknown, &mut warnings),
        };

        let record = TrialRecord {
            url: TrialRecord::study_url(&id),
            id,
            title,
            official_title,
            brief_summary: text_at(root, BRIEF_SUMMARY).ok().map(str::to_string),
            status,
            phase,
            study_type,
            conditions: strings_at(root, CONDITIONS),
            start_date,
            primary_completion_date,
            completion_date,
            duration,
            enrollment,
            outcomes: Outcomes {
                primary: outcome_lines(root, PRIMARY_OUTCOMES),
                secondary: outcome_lines(root, SECONDARY_OUTCOMES),
            },
            has_results,
            results,
            sponsor,
        };

        Ok(Normalized { record, warnings })
    }
}

fn required_text<'a>(root: &'a Value, path: &[&str]) -> Result<&'a str, MalformedRecord> {
    match str_at(root, path) {
        Field::Present(s) if s.trim().is_empty() => Err(MalformedRecord::empty(dotted(path))),
        Field::Present(s) => Ok(s.trim()),
        Field::Missing => Err(MalformedRecord::missing(dotted(path))),
        Field::Malformed { expected } => Err(MalformedRecord::wrong_type(dotted(path), expected)),
    }
}

/// Parse an optional categorical string, falling back to `unknown`.
fn categorical<T: FromStr>(
    root: &Value,
    path: &[&str],
    unknown: T,
    warnings: &mut Vec<RecordWarning>,
) -> T {
    match str_at(root, path) {
        Field::Present(raw) if raw.trim().is_empty() => unknown,
        Field::Present(raw) => raw.parse().unwrap_or_else(|_| {
            warnings.push(unrecognized(path, raw));
            unknown
        }),
        Field::Missing => unknown,
        Field::Malformed { .. } => {
            warnings.push(unrecognized(path, &non_string(root, path)));
            unknown
        }
    }
}

fn phase_of(root: &Value, warnings: &mut Vec<RecordWarning>) -> Phase {
    match array_at(root, PHASES) {
        Field::Present(items) => {
            let codes: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            codes
                .as_deref()
                .and_then(Phase::from_codes)
                .unwrap_or_else(|| {
                    warnings.push(unrecognized(PHASES, &non_string(root, PHASES)));
                    Phase::Unknown
                })
        }
        Field::Missing => Phase::Unknown,
        Field::Malformed { .. } => {
            warnings.push(unrecognized(PHASES, &non_string(root, PHASES)));
            Phase::Unknown
        }
    }
}

/// Optional scalar that may carry the wrong JSON type; such values are
/// reported and then treated as absent.
fn reported<T>(
    root: &Value,
    field: Field<T>,
    path: &[&str],
    warnings: &mut Vec<RecordWarning>,
) -> Option<T> {
    if field.is_malformed() {
        warnings.push(unrecognized(path, &non_string(root, path)));
    }
    field.ok()
}

/// Read `statusModule.<name>` as `{date, type}`.
///
/// A missing `type` is taken as actual. A date that fails to parse is
/// reported and comes back malformed.
fn trial_date(root: &Value, name: &str, warnings: &mut Vec<RecordWarning>) -> Field<TrialDate> {
    let date_path = [PROTOCOL, "statusModule", name, "date"];
    let type_path = [PROTOCOL, "statusModule", name, "type"];
    let field = format!("{name}.date");

    let raw = match str_at(root, &date_path) {
        Field::Present(raw) if raw.trim().is_empty() => return Field::Missing,
        Field::Present(raw) => raw.to_string(),
        Field::Missing => return Field::Missing,
        Field::Malformed { .. } => non_string(root, &date_path),
    };
    let kind = optional_kind(root, &type_path, warnings).unwrap_or(DateKind::Actual);

    match TrialDate::parse(&field, &raw, kind) {
        Ok(date) => Field::Present(date),
        Err(err) => {
            warnings.push(RecordWarning::DateParse(err));
            Field::Malformed { expected: "date" }
        }
    }
}

fn optional_kind(
    root: &Value,
    path: &[&str],
    warnings: &mut Vec<RecordWarning>,
) -> Option<DateKind> {
    let raw = text_at(root, path).ok()?;
    match raw.parse() {
        Ok(kind) => Some(kind),
        Err(_) => {
            warnings.push(unrecognized(path, raw));
            None
        }
    }
}

/// "measure" or "measure: description"; entries with neither are dropped.
fn outcome_lines(root: &Value, path: &[&str]) -> Vec<String> {
    let Some(items) = array_at(root, path).ok() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let measure = text_at(item, &["measure"]).ok().map(str::trim);
            let description = text_at(item, &["description"]).ok().map(str::trim);
            match (measure, description) {
                (Some(m), Some(d)) => Some(format!("{m}: {d}")),
                (Some(m), None) => Some(m.to_string()),
                (None, Some(d)) => Some(d.to_string()),
                (None, None) => None,
            }
        })
        .collect()
}

fn results_summary(section: &Value) -> ResultsSummary {
    let measures = array_at(section, OUTCOME_MEASURES).ok().unwrap_or_default();
    let has_adverse_events = object_at(section, ADVERSE_EVENTS)
        .ok()
        .is_some_and(|module| !module.is_empty());
    ResultsSummary {
        outcome_measure_count: measures.len(),
        outcome_measure_titles: measures
            .iter()
            .take(RESULT_TITLES_KEPT)
            .filter_map(|m| text_at(m, &["title"]).ok())
            .map(|t| t.trim().to_string())
            .collect(),
        has_adverse_events,
    }
}

fn unrecognized(path: &[&str], value: &str) -> RecordWarning {
    RecordWarning::UnrecognizedValue {
        field: dotted(path),
        value: value.to_string(),
    }
}

fn non_string(root: &Value, path: &[&str]) -> String {
    lookup(root, path)
        .ok()
        .map(Value::to_string)
        .unwrap_or_default()
}
