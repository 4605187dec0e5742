//! Tests for aggregation and merge.

use chrono::NaiveDate;
use cts_core::{AggregateBuilder, RecordNormalizer, aggregate, failed, merge};
use cts_model::{
    AggregateWarning, DurationResult, DurationStatus, Outcomes, Phase, RawRecord, Sponsor,
    SponsorClass, StudyType, TermStatus, TrialRecord, TrialStatus,
};
use proptest::prelude::*;
use serde_json::json;

fn trial(id: &str, status: TrialStatus, months: Option<f64>) -> TrialRecord {
    TrialRecord {
        id: id.to_string(),
        title: format!("Trial {id}"),
        official_title: None,
        brief_summary: None,
        status,
        phase: Phase::Phase2,
        study_type: StudyType::Interventional,
        conditions: vec![],
        start_date: None,
        primary_completion_date: None,
        completion_date: None,
        duration: months.map(|m| DurationResult {
            days: (m * 30.44).round() as i64,
            months: m,
            years: 0.0,
            status: DurationStatus::Actual,
        }),
        enrollment: None,
        outcomes: Outcomes::default(),
        has_results: false,
        results: None,
        sponsor: Sponsor {
            name: None,
            class: SponsorClass::Industry,
        },
        url: TrialRecord::study_url(id),
    }
}

// =========================================================================
// Per-disease aggregation
// =========================================================================

#[test]
fn test_duplicate_ids_first_seen_wins() {
    let mut later = trial("NCT1", TrialStatus::Terminated, None);
    later.title = "Second copy".to_string();
    let result = aggregate(
        "asthma",
        vec![
            trial("NCT1", TrialStatus::Completed, Some(6.0)),
            trial("NCT2", TrialStatus::Recruiting, None),
            later,
        ],
    );

    assert_eq!(result.total_trials(), 2);
    assert_eq!(result.trials[0].title, "Trial NCT1");
    assert_eq!(result.status_counts.get(&TrialStatus::Completed), Some(&1));
    assert_eq!(result.status_counts.get(&TrialStatus::Terminated), None);
    assert_eq!(result.term_status(), TermStatus::Succeeded);
}

#[test]
fn test_counts_include_unknown_bucket() {
    let result = aggregate("asthma", vec![trial("NCT1", TrialStatus::Completed, None)]);
    assert_eq!(result.status_counts.get(&TrialStatus::Unknown), Some(&0));
    assert_eq!(result.phase_counts.get(&Phase::Unknown), Some(&0));
    assert_eq!(result.phase_counts.get(&Phase::Phase2), Some(&1));
}

#[test]
fn test_duration_stats_use_known_durations_only() {
    let result = aggregate(
        "copd",
        vec![
            trial("NCT1", TrialStatus::Completed, Some(6.0)),
            trial("NCT2", TrialStatus::Completed, Some(12.0)),
            trial("NCT3", TrialStatus::Completed, Some(24.0)),
            trial("NCT4", TrialStatus::Recruiting, None),
        ],
    );

    let stats = result.duration_stats;
    assert_eq!(stats.count, 3);
    assert_eq!(stats.mean, 14.0);
    assert_eq!(stats.median, 12.0);
    assert_eq!(stats.min, 6.0);
    assert_eq!(stats.max, 24.0);
    // population variance: (64 + 4 + 100) / 3 = 56
    assert!((stats.stdev - 56f64.sqrt()).abs() < 1e-9);
    assert_eq!(result.completion_rate, 0.75);
}

#[test]
fn test_even_count_median_is_midpoint() {
    let result = aggregate(
        "copd",
        vec![
            trial("NCT1", TrialStatus::Completed, Some(10.0)),
            trial("NCT2", TrialStatus::Completed, Some(4.0)),
        ],
    );
    assert_eq!(result.duration_stats.median, 7.0);
}

#[test]
fn test_all_unknown_durations_distinct_from_no_trials() {
    let unknown_only = aggregate("gout", vec![trial("NCT1", TrialStatus::Recruiting, None)]);
    let empty = aggregate("lupus", Vec::new());

    assert_eq!(unknown_only.duration_stats.count, 0);
    assert_eq!(unknown_only.duration_stats.mean, 0.0);
    assert_eq!(unknown_only.term_status(), TermStatus::Succeeded);

    assert_eq!(empty.duration_stats.count, 0);
    assert_eq!(empty.completion_rate, 0.0);
    assert_eq!(empty.term_status(), TermStatus::NoTrials);
}

#[test]
fn test_results_rate() {
    let mut with = trial("NCT1", TrialStatus::Completed, None);
    with.has_results = true;
    let result = aggregate(
        "copd",
        vec![with, trial("NCT2", TrialStatus::Completed, None)],
    );
    assert_eq!(result.with_results, 1);
    assert_eq!(result.results_rate, 0.5);
}

#[test]
fn test_failed_term_is_reported_not_omitted() {
    let result = failed("psoriasis", 4, "registry returned HTTP 503");
    assert_eq!(result.term_status(), TermStatus::Failed);
    assert_eq!(result.total_trials(), 0);
    assert!(matches!(
        result.warnings.as_slice(),
        [AggregateWarning::QueryFailed { attempts: 4, .. }]
    ));
}

#[test]
fn test_builder_counts_skipped_records() {
    let normalizer = RecordNormalizer::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let mut builder = AggregateBuilder::new("asthma");
    builder.ingest(
        &normalizer,
        &RawRecord::new(json!({
            "protocolSection": {"identificationModule": {"nctId": "NCT9", "briefTitle": "ok"}}
        })),
    );
    builder.ingest(
        &normalizer,
        &RawRecord::new(json!({"protocolSection": {"identificationModule": {"nctId": "NCT10"}}})),
    );
    builder.ingest(&normalizer, &RawRecord::new(json!({"unexpected": true})));

    let result = builder.finish();
    assert_eq!(result.total_trials(), 1);
    assert_eq!(result.skipped_records, 2);
    assert!(matches!(
        &result.warnings[0],
        AggregateWarning::SkippedRecord { error } if error.trial_id.as_deref() == Some("NCT10")
    ));
}

// =========================================================================
// Merge
// =========================================================================

#[test]
fn test_merge_dedupes_across_terms_in_term_order() {
    let mut first = aggregate(
        "diabetes",
        vec![
            trial("NCT1", TrialStatus::Completed, Some(6.0)),
            trial("NCT2", TrialStatus::Completed, None),
        ],
    );
    let unrecognized = AggregateWarning::UnrecognizedValue {
        trial_id: "NCT1".to_string(),
        field: "protocolSection.designModule.studyType".to_string(),
        value: "PILOT".to_string(),
    };
    first.warnings.push(unrecognized.clone());
    first.skipped_records = 2;
    let mut shared = trial("NCT1", TrialStatus::Completed, Some(6.0));
    shared.title = "Seen under obesity".to_string();
    let mut second = aggregate(
        "obesity",
        vec![shared, trial("NCT3", TrialStatus::Recruiting, None)],
    );
    second.warnings.push(unrecognized.clone());
    second.skipped_records = 1;
    let third = failed("gout", 4, "timeout");

    let aggregates = vec![first, second, third];
    let before = aggregates.clone();
    let overall = merge(&aggregates);

    assert_eq!(aggregates, before);
    assert_eq!(overall.total_trials(), 3);
    assert_eq!(overall.trials_before_dedup, 4);
    assert_eq!(overall.trials[0].title, "Trial NCT1");
    assert_eq!(overall.terms, 3);
    assert_eq!(overall.terms_with_trials, 2);
    assert_eq!(overall.failed_terms, vec!["gout"]);
    assert_eq!(overall.status_counts.get(&TrialStatus::Completed), Some(&2));
    assert_eq!(aggregates[1].total_trials(), 2);
    assert_eq!(overall.skipped_records, 3);
    assert_eq!(overall.warnings.len(), 2);
    assert_eq!(overall.warnings[0], unrecognized);
    assert!(matches!(
        overall.warnings[1],
        AggregateWarning::QueryFailed { attempts: 4, .. }
    ));
}

#[test]
fn test_merge_of_nothing() {
    let overall = merge(&[]);
    assert_eq!(overall.total_trials(), 0);
    assert_eq!(overall.completion_rate, 0.0);
    assert_eq!(overall.status_counts.get(&TrialStatus::Unknown), Some(&0));
}

// =========================================================================
// Properties
// =========================================================================

fn status_strategy() -> impl Strategy<Value = TrialStatus> {
    prop_oneof![
        Just(TrialStatus::Completed),
        Just(TrialStatus::Recruiting),
        Just(TrialStatus::Terminated),
        Just(TrialStatus::Unknown),
    ]
}

fn records_strategy() -> impl Strategy<Value = Vec<TrialRecord>> {
    proptest::collection::vec(
        (0u8..20, status_strategy(), proptest::option::of(0.0..120.0f64)),
        0..40,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(id, status, months)| trial(&format!("NCT{id:08}"), status, months))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_trial_ids_are_unique(records in records_strategy()) {
        let result = aggregate("term", records.clone());
        let mut ids: Vec<&str> = result.trials.iter().map(|t| t.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }

    #[test]
    fn prop_counts_sum_to_total(records in records_strategy()) {
        let result = aggregate("term", records);
        prop_assert_eq!(result.status_counts.values().sum::<usize>(), result.total_trials());
        prop_assert_eq!(result.phase_counts.values().sum::<usize>(), result.total_trials());
        prop_assert!(result.duration_stats.count <= result.total_trials());
        prop_assert!((0.0..=1.0).contains(&result.completion_rate));
    }

    #[test]
    fn prop_stats_bounded_by_min_max(records in records_strategy()) {
        let stats = aggregate("term", records).duration_stats;
        if stats.count > 0 {
            prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
            prop_assert!(stats.min <= stats.mean + 1e-9 && stats.mean <= stats.max + 1e-9);
            prop_assert!(stats.stdev >= 0.0);
        }
    }

    #[test]
    fn prop_merge_is_independent_of_split(records in records_strategy(), split in 0usize..40) {
        let split = split.min(records.len());
        let (left, right) = records.split_at(split);
        let whole = aggregate("all", records.clone());
        let overall = merge(&[aggregate("a", left.to_vec()), aggregate("b", right.to_vec())]);
        prop_assert_eq!(overall.trials, whole.trials);
        prop_assert_eq!(overall.status_counts, whole.status_counts);
    }
}
