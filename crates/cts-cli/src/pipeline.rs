//! Run pipeline: query every term, normalize, aggregate, merge.
//!
//! Terms are fetched concurrently up to `run.workers`; all requests share the
//! orchestrator's pacing gate. Each term's records are buffered until its
//! query finishes, and aggregates are built and merged in input term order,
//! so the report does not depend on which query finished first.

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};

use cts_core::{AggregateBuilder, RecordNormalizer, failed, merge};
use cts_model::{DiseaseAggregate, FilterSet, OverallAggregate, RawRecord, TermStatus};
use cts_registry::{QueryFailure, QueryOrchestrator};

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no disease terms to query")]
    NoTerms,

    /// Every term failed before any response arrived from the registry.
    #[error("registry unreachable: all {terms} term(s) failed without a response ({reason})")]
    RegistryUnreachable { terms: usize, reason: String },
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    /// Reference date for ongoing durations and the completion window.
    pub today: NaiveDate,
    pub filters: FilterSet,
    /// One aggregate per requested term, in input order.
    pub terms: Vec<DiseaseAggregate>,
    pub overall: OverallAggregate,
    /// Raw registry payloads per fetched term, in input order, when retained.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw: Vec<TermPayloads>,
    pub cancelled: bool,
}

/// Raw records received for one input term.
#[derive(Debug, Clone, Serialize)]
pub struct TermPayloads {
    /// Position of the term in the input; repeated terms keep separate entries.
    pub index: usize,
    pub term: String,
    pub records: Vec<RawRecord>,
}

impl RunReport {
    pub fn failed_terms(&self) -> usize {
        self.terms.iter().filter(|t| t.query_failed).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_terms() > 0
    }
}

/// Progress notification, sent as each term's query finishes.
#[derive(Debug, Clone, Copy)]
pub struct TermEvent<'a> {
    /// Position of the term in the input.
    pub index: usize,
    pub term: &'a str,
    /// Raw records received; 0 for a failed term.
    pub records: usize,
    pub failed: bool,
}

enum TermOutcome {
    Fetched(Vec<RawRecord>),
    Failed(QueryFailure),
}

/// Run the pipeline over `terms`.
///
/// `today` is fixed for the whole run. `observer` is called once per term
/// in completion order.
pub async fn run(
    terms: &[String],
    settings: &Settings,
    orchestrator: &QueryOrchestrator,
    today: NaiveDate,
    mut observer: impl FnMut(&TermEvent<'_>),
) -> Result<RunReport, RunError> {
    if terms.is_empty() {
        return Err(RunError::NoTerms);
    }

    let filters = settings.filters.resolve(today);
    let max_records = settings.registry.max_records;
    let workers = settings.run.workers.max(1);
    info!(
        terms = terms.len(),
        workers,
        max_records,
        completed_after = ?filters.completed_after,
        "starting run"
    );

    let mut outcomes: Vec<Option<TermOutcome>> = terms.iter().map(|_| None).collect();
    {
        let filters = &filters;
        let mut completions = stream::iter(terms.iter().enumerate())
            .map(|(index, term)| async move {
                let outcome = fetch_term(orchestrator, term, filters, max_records)
                    .instrument(info_span!("term", term = %term))
                    .await;
                (index, outcome)
            })
            .buffer_unordered(workers);

        while let Some((index, outcome)) = completions.next().await {
            let (records, failed) = match &outcome {
                TermOutcome::Fetched(records) => (records.len(), false),
                TermOutcome::Failed(_) => (0, true),
            };
            observer(&TermEvent {
                index,
                term: &terms[index],
                records,
                failed,
            });
            outcomes[index] = Some(outcome);
        }
    }

    let outcomes: Vec<TermOutcome> = terms
        .iter()
        .zip(outcomes)
        .map(|(term, outcome)| outcome.unwrap_or_else(|| TermOutcome::Failed(QueryFailure::cancelled(term))))
        .collect();

    if let Some(reason) = unreachable_reason(&outcomes) {
        return Err(RunError::RegistryUnreachable {
            terms: terms.len(),
            reason,
        });
    }

    let normalizer = RecordNormalizer::new(today);
    let mut aggregates = Vec::with_capacity(terms.len());
    let mut raw = Vec::new();
    for (index, (term, outcome)) in terms.iter().zip(outcomes).enumerate() {
        let aggregate = match outcome {
            TermOutcome::Fetched(records) => {
                let aggregate = build_aggregate(term, &records, &normalizer);
                if settings.run.retain_raw {
                    raw.push(TermPayloads {
                        index,
                        term: term.clone(),
                        records,
                    });
                }
                aggregate
            }
            TermOutcome::Failed(failure) => {
                failed(term.as_str(), failure.attempts, failure.source.to_string())
            }
        };
        aggregates.push(aggregate);
    }

    let overall = merge(&aggregates);
    info!(
        trials = overall.total_trials(),
        before_dedup = overall.trials_before_dedup,
        failed_terms = overall.failed_terms.len(),
        "run complete"
    );

    Ok(RunReport {
        generated_at: Utc::now(),
        today,
        filters,
        terms: aggregates,
        overall,
        raw,
        cancelled: orchestrator.cancel_token().is_cancelled(),
    })
}

/// Drain one term's stream. A failure discards any records already received.
async fn fetch_term(
    orchestrator: &QueryOrchestrator,
    term: &str,
    filters: &FilterSet,
    max_records: usize,
) -> TermOutcome {
    let stream = orchestrator.query(term, filters, max_records);
    futures_util::pin_mut!(stream);

    let mut records = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => records.push(record),
            Err(failure) => {
                warn!(
                    attempts = failure.attempts,
                    discarded = records.len(),
                    error = %failure.source,
                    "{}",
                    failure.source.user_message()
                );
                return TermOutcome::Failed(failure);
            }
        }
    }
    debug!(records = records.len(), "query complete");
    TermOutcome::Fetched(records)
}

fn build_aggregate(term: &str, records: &[RawRecord], normalizer: &RecordNormalizer) -> DiseaseAggregate {
    let mut builder = AggregateBuilder::new(term);
    for record in records {
        builder.ingest(normalizer, record);
    }
    let aggregate = builder.finish();

    if aggregate.skipped_records > 0 {
        warn!(term, skipped = aggregate.skipped_records, "skipped malformed records");
    }
    let status = aggregate.term_status();
    if status == TermStatus::NoTrials {
        info!(term, "no trials found");
    } else {
        info!(
            term,
            trials = aggregate.total_trials(),
            duplicates = records.len().saturating_sub(aggregate.total_trials() + aggregate.skipped_records),
            "term aggregated"
        );
    }
    aggregate
}

/// A reason when no term got any response from the registry. A term that
/// received pages before timing out did reach it.
fn unreachable_reason(outcomes: &[TermOutcome]) -> Option<String> {
    let mut first = None;
    for outcome in outcomes {
        match outcome {
            TermOutcome::Failed(failure) if failure.is_unreachable() => {
                first.get_or_insert_with(|| failure.source.to_string());
            }
            _ => return None,
        }
    }
    first
}
