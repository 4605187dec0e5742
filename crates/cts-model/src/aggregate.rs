//! Per-disease and overall aggregate structures.
//!
//! These are the output surface of the pipeline. They are built by
//! `cts-core` and consumed by writers and exporters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{Phase, TrialStatus};
use crate::error::{DateParseError, MalformedRecord};
use crate::record::TrialRecord;

/// Summary statistics over known durations, in months.
///
/// All values are 0 when `count` is 0; check `count` to tell "no data" from
/// "zero duration".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

/// Data-quality or query problem recorded against an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateWarning {
    /// A record was skipped because a required field was missing or invalid.
    SkippedRecord { error: MalformedRecord },
    /// A date could not be parsed; the date was treated as absent.
    DateParse {
        trial_id: String,
        error: DateParseError,
    },
    /// Completion precedes start. The negative value is kept.
    NegativeDuration { trial_id: String, days: i64 },
    /// A categorical value the model does not recognize; recorded as unknown.
    UnrecognizedValue {
        trial_id: String,
        field: String,
        value: String,
    },
    /// The registry query for this term failed after retries.
    QueryFailed { attempts: u32, message: String },
}

impl fmt::Display for AggregateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedRecord { error } => match &error.trial_id {
                Some(id) => write!(f, "skipped {id}: {error}"),
                None => write!(f, "skipped record: {error}"),
            },
            Self::DateParse { trial_id, error } => write!(f, "{trial_id}: {error}"),
            Self::NegativeDuration { trial_id, days } => {
                write!(f, "{trial_id}: completion precedes start by {} days", -days)
            }
            Self::UnrecognizedValue {
                trial_id,
                field,
                value,
            } => write!(f, "{trial_id}: unrecognized {field} '{value}'"),
            Self::QueryFailed { attempts, message } => {
                write!(f, "query failed after {attempts} attempt(s): {message}")
            }
        }
    }
}

/// How a term's query ended, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    /// Query succeeded and returned at least one trial.
    Succeeded,
    /// Query succeeded with zero trials.
    NoTrials,
    /// Query was attempted but failed.
    Failed,
}

impl TermStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TermStatus::Succeeded => "ok",
            TermStatus::NoTrials => "no trials",
            TermStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TermStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Statistics for one disease term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseAggregate {
    pub term: String,
    /// Trials unique by id, in first-seen order.
    pub trials: Vec<TrialRecord>,
    pub status_counts: BTreeMap<TrialStatus, usize>,
    pub phase_counts: BTreeMap<Phase, usize>,
    pub duration_stats: DurationStats,
    /// Fraction of trials with status `COMPLETED`.
    pub completion_rate: f64,
    pub with_results: usize,
    /// Fraction of trials with posted results.
    pub results_rate: f64,
    /// Number of records skipped as malformed.
    pub skipped_records: usize,
    pub query_failed: bool,
    pub warnings: Vec<AggregateWarning>,
}

impl DiseaseAggregate {
    pub fn total_trials(&self) -> usize {
        self.trials.len()
    }

    pub fn term_status(&self) -> TermStatus {
        if self.query_failed {
            TermStatus::Failed
        } else if self.trials.is_empty() {
            TermStatus::NoTrials
        } else {
            TermStatus::Succeeded
        }
    }
}

/// Statistics across all disease terms, trials deduplicated by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAggregate {
    /// Trials unique by id, first-seen across terms in processing order.
    pub trials: Vec<TrialRecord>,
    pub status_counts: BTreeMap<TrialStatus, usize>,
    pub phase_counts: BTreeMap<Phase, usize>,
    pub duration_stats: DurationStats,
    pub completion_rate: f64,
    pub with_results: usize,
    pub results_rate: f64,
    /// Number of terms merged.
    pub terms: usize,
    pub terms_with_trials: usize,
    pub failed_terms: Vec<String>,
    /// Per-term trial counts summed before cross-term deduplication.
    pub trials_before_dedup: usize,
    /// Malformed records skipped, summed across terms.
    pub skipped_records: usize,
    /// Per-term warnings in term order; a warning raised identically under
    /// several terms appears once.
    pub warnings: Vec<AggregateWarning>,
}

impl OverallAggregate {
    pub fn total_trials(&self) -> usize {
        self.trials.len()
    }
}
