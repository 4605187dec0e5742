//! Per-disease aggregation and cross-disease merge.
//!
//! Aggregation is a fold over normalized records: start from an empty
//! [`AggregateBuilder`], push records in the order the registry returned
//! them, then [`finish`](AggregateBuilder::finish). Duplicates are dropped on
//! first-seen-wins, so the result depends only on input order.

use std::collections::{BTreeMap, BTreeSet};

use cts_model::{
    AggregateWarning, DiseaseAggregate, DurationStats, MalformedRecord, OverallAggregate, Phase,
    RawRecord, TrialRecord, TrialStatus,
};

use crate::normalize::{Normalized, RecordNormalizer};

/// Accumulates one disease term's records.
#[derive(Debug, Clone)]
pub struct AggregateBuilder {
    term: String,
    trials: Vec<TrialRecord>,
    seen: BTreeSet<String>,
    skipped_records: usize,
    warnings: Vec<AggregateWarning>,
}

impl AggregateBuilder {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            trials: Vec::new(),
            seen: BTreeSet::new(),
            skipped_records: 0,
            warnings: Vec::new(),
        }
    }

    /// Add a record. Returns `false` if its id was already seen.
    pub fn push(&mut self, record: TrialRecord) -> bool {
        if !self.seen.insert(record.id.clone()) {
            return false;
        }
        self.trials.push(record);
        true
    }

    /// Add a normalized record together with its warnings.
    ///
    /// Warnings from a dropped duplicate are dropped with it.
    pub fn push_normalized(&mut self, normalized: Normalized) -> bool {
        if self.seen.contains(&normalized.record.id) {
            return false;
        }
        self.warnings.extend(normalized.aggregate_warnings());
        self.push(normalized.record)
    }

    /// Record a skipped malformed record.
    pub fn skip(&mut self, error: MalformedRecord) {
        self.skipped_records += 1;
        self.warnings.push(AggregateWarning::SkippedRecord { error });
    }

    /// Normalize a raw record and add it, or count it as skipped.
    pub fn ingest(&mut self, normalizer: &RecordNormalizer, raw: &RawRecord) {
        match normalizer.normalize(raw) {
            Ok(normalized) => {
                self.push_normalized(normalized);
            }
            Err(error) => {
                let error = match (error.trial_id.is_none(), raw.trial_id()) {
                    (true, Some(id)) => error.with_trial_id(id),
                    _ => error,
                };
                self.skip(error);
            }
        }
    }

    pub fn finish(self) -> DiseaseAggregate {
        let summary = Summary::of(&self.trials);
        DiseaseAggregate {
            term: self.term,
            trials: self.trials,
            status_counts: summary.status_counts,
            phase_counts: summary.phase_counts,
            duration_stats: summary.duration_stats,
            completion_rate: summary.completion_rate,
            with_results: summary.with_results,
            results_rate: summary.results_rate,
            skipped_records: self.skipped_records,
            query_failed: false,
            warnings: self.warnings,
        }
    }
}

/// Fold records for one term into its aggregate.
pub fn aggregate(
    term: impl Into<String>,
    records: impl IntoIterator<Item = TrialRecord>,
) -> DiseaseAggregate {
    records
        .into_iter()
        .fold(AggregateBuilder::new(term), |mut builder, record| {
            builder.push(record);
            builder
        })
        .finish()
}

/// Aggregate for a term whose query failed: no trials, zeroed statistics.
pub fn failed(term: impl Into<String>, attempts: u32, message: impl Into<String>) -> DiseaseAggregate {
    let mut aggregate = AggregateBuilder::new(term).finish();
    aggregate.query_failed = true;
    aggregate.warnings.push(AggregateWarning::QueryFailed {
        attempts,
        message: message.into(),
    });
    aggregate
}

/// Union per-disease trial sets by id, in the given order, and recompute.
///
/// The inputs are not modified.
pub fn merge(aggregates: &[DiseaseAggregate]) -> OverallAggregate {
    let mut seen = BTreeSet::new();
    let trials: Vec<TrialRecord> = aggregates
        .iter()
        .flat_map(|a| a.trials.iter())
        .filter(|t| seen.insert(t.id.as_str()))
        .cloned()
        .collect();
    let summary = Summary::of(&trials);

    OverallAggregate {
        trials,
        status_counts: summary.status_counts,
        phase_counts: summary.phase_counts,
        duration_stats: summary.duration_stats,
        completion_rate: summary.completion_rate,
        with_results: summary.with_results,
        results_rate: summary.results_rate,
        terms: aggregates.len(),
        terms_with_trials: aggregates.iter().filter(|a| !a.trials.is_empty()).count(),
        failed_terms: aggregates
            .iter()
            .filter(|a| a.query_failed)
            .map(|a| a.term.clone())
            .collect(),
        trials_before_dedup: aggregates.iter().map(|a| a.trials.len()).sum(),
        skipped_records: aggregates.iter().map(|a| a.skipped_records).sum(),
        warnings: roll_up_warnings(aggregates),
    }
}

fn roll_up_warnings(aggregates: &[DiseaseAggregate]) -> Vec<AggregateWarning> {
    let mut warnings: Vec<AggregateWarning> = Vec::new();
    for warning in aggregates.iter().flat_map(|a| a.warnings.iter()) {
        if !warnings.contains(warning) {
            warnings.push(warning.clone());
        }
    }
    warnings
}

/// Statistics over known durations, in months.
pub fn duration_stats<'a>(records: impl IntoIterator<Item = &'a TrialRecord>) -> DurationStats {
    let mut months: Vec<f64> = records
        .into_iter()
        .filter_map(|r| r.duration.as_ref())
        .map(|d| d.months)
        .collect();
    if months.is_empty() {
        return DurationStats::default();
    }
    months.sort_by(f64::total_cmp);

    let count = months.len();
    let n = count as f64;
    let mean = months.iter().sum::<f64>() / n;
    let median = if count % 2 == 0 {
        (months[count / 2 - 1] + months[count / 2]) / 2.0
    } else {
        months[count / 2]
    };
    let variance = months.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;

    DurationStats {
        count,
        mean,
        median,
        stdev: variance.sqrt(),
        min: months[0],
        max: months[count - 1],
    }
}

struct Summary {
    status_counts: BTreeMap<TrialStatus, usize>,
    phase_counts: BTreeMap<Phase, usize>,
    duration_stats: DurationStats,
    completion_rate: f64,
    with_results: usize,
    results_rate: f64,
}

impl Summary {
    fn of(trials: &[TrialRecord]) -> Self {
        let mut status_counts = BTreeMap::from([(TrialStatus::Unknown, 0)]);
        let mut phase_counts = BTreeMap::from([(Phase::Unknown, 0)]);
        for trial in trials {
            *status_counts.entry(trial.status).or_insert(0) += 1;
            *phase_counts.entry(trial.phase).or_insert(0) += 1;
        }

        let completed = status_counts
            .get(&TrialStatus::Completed)
            .copied()
            .unwrap_or(0);
        let with_results = trials.iter().filter(|t| t.has_results).count();

        Self {
            status_counts,
            phase_counts,
            duration_stats: duration_stats(trials),
            completion_rate: rate(completed, trials.len()),
            with_results,
            results_rate: rate(with_results, trials.len()),
        }
    }
}

fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
