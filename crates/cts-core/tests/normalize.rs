//! Tests for record normalization.

use chrono::NaiveDate;
use cts_core::{RecordNormalizer, RecordWarning};
use cts_model::{
    DatePrecision, DateKind, DurationStatus, MalformedReason, Phase, RawRecord, SponsorClass,
    StudyType, TrialStatus,
};
use serde_json::{Value, json};

fn normalizer() -> RecordNormalizer {
    RecordNormalizer::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn full_study() -> Value {
    json!({
        "protocolSection": {
            "identificationModule": {
                "nctId": "NCT04000001",
                "briefTitle": "Drug A in Type 2 Diabetes",
                "officialTitle": "A Randomized Study of Drug A in Adults With Type 2 Diabetes"
            },
            "statusModule": {
                "overallStatus": "COMPLETED",
                "startDateStruct": {"date": "2020-01-01", "type": "ACTUAL"},
                "primaryCompletionDateStruct": {"date": "2020-06", "type": "ACTUAL"},
                "completionDateStruct": {"date": "2020-07-01", "type": "ACTUAL"}
            },
            "conditionsModule": {"conditions": ["Type 2 Diabetes", "Obesity"]},
            "designModule": {
                "studyType": "INTERVENTIONAL",
                "phases": ["PHASE2", "PHASE3"],
                "enrollmentInfo": {"count": 240, "type": "ACTUAL"}
            },
            "descriptionModule": {"briefSummary": "Evaluates Drug A."},
            "outcomesModule": {
                "primaryOutcomes": [
                    {"measure": "Change in HbA1c", "description": "From baseline", "timeFrame": "26 weeks"}
                ],
                "secondaryOutcomes": [{"measure": "Body weight", "timeFrame": "26 weeks"}]
            },
            "sponsorCollaboratorsModule": {
                "leadSponsor": {"name": "Acme Pharma", "class": "INDUSTRY"}
            }
        },
        "resultsSection": {
            "outcomeMeasuresModule": {"outcomeMeasures": [{"title": "Change in HbA1c"}]},
            "adverseEventsModule": {"frequencyThreshold": "5"}
        },
        "hasResults": true
    })
}

fn minimal_study(id: &str) -> Value {
    json!({
        "protocolSection": {
            "identificationModule": {"nctId": id, "briefTitle": "Minimal"}
        }
    })
}

// =========================================================================
// Field extraction
// =========================================================================

#[test]
fn test_full_record() {
    let normalized = normalizer()
        .normalize(&RawRecord::new(full_study()))
        .unwrap();
    let record = normalized.record;

    assert!(normalized.warnings.is_empty());
    assert_eq!(record.id, "NCT04000001");
    assert_eq!(record.title, "Drug A in Type 2 Diabetes");
    assert_eq!(
        record.official_title.as_deref(),
        Some("A Randomized Study of Drug A in Adults With Type 2 Diabetes")
    );
    assert_eq!(record.status, TrialStatus::Completed);
    assert_eq!(record.phase, Phase::Phase2Phase3);
    assert_eq!(record.study_type, StudyType::Interventional);
    assert_eq!(record.conditions, vec!["Type 2 Diabetes", "Obesity"]);
    assert_eq!(record.brief_summary.as_deref(), Some("Evaluates Drug A."));
    assert_eq!(record.sponsor.name.as_deref(), Some("Acme Pharma"));
    assert_eq!(record.sponsor.class, SponsorClass::Industry);
    assert_eq!(record.url, "https://clinicaltrials.gov/study/NCT04000001");
    assert!(record.is_complete());

    let enrollment = record.enrollment.unwrap();
    assert_eq!(enrollment.count, 240);
    assert_eq!(enrollment.kind, Some(DateKind::Actual));

    assert_eq!(record.outcomes.primary, vec!["Change in HbA1c: From baseline"]);
    assert_eq!(record.outcomes.secondary, vec!["Body weight"]);

    assert!(record.has_results);
    let results = record.results.unwrap();
    assert_eq!(results.outcome_measure_count, 1);
    assert!(results.has_adverse_events);
}

#[test]
fn test_dates_keep_precision_and_duration_is_computed() {
    let record = normalizer()
        .normalize(&RawRecord::new(full_study()))
        .unwrap()
        .record;

    let primary = record.primary_completion_date.unwrap();
    assert_eq!(primary.precision, DatePrecision::Month);
    assert_eq!(primary.to_string(), "2020-06");

    let duration = record.duration.unwrap();
    assert_eq!(duration.days, 182);
    assert_eq!(duration.status, DurationStatus::Actual);
}

#[test]
fn test_minimal_record_uses_unknown_markers() {
    let record = normalizer()
        .normalize(&RawRecord::new(minimal_study("NCT00000001")))
        .unwrap()
        .record;

    assert_eq!(record.status, TrialStatus::Unknown);
    assert_eq!(record.phase, Phase::Unknown);
    assert_eq!(record.study_type, StudyType::Unknown);
    assert_eq!(record.sponsor.class, SponsorClass::Unknown);
    assert!(record.sponsor.name.is_none());
    assert!(record.enrollment.is_none());
    assert!(record.start_date.is_none());
    assert!(record.duration.is_none());
    assert_eq!(record.duration_status(), DurationStatus::Unknown);
    assert!(!record.has_results);
    assert!(record.results.is_none());
}

#[test]
fn test_missing_date_type_is_actual() {
    let mut study = minimal_study("NCT00000002");
    study["protocolSection"]["statusModule"] = json!({
        "overallStatus": "RECRUITING",
        "startDateStruct": {"date": "2024-05"}
    });
    let record = normalizer().normalize(&RawRecord::new(study)).unwrap().record;

    let start = record.start_date.unwrap();
    assert_eq!(start.kind, DateKind::Actual);
    let duration = record.duration.unwrap();
    assert_eq!(duration.status, DurationStatus::Ongoing);
    assert_eq!(duration.days, 31);
}

#[test]
fn test_official_title_used_when_brief_title_missing() {
    let study = json!({
        "protocolSection": {
            "identificationModule": {"nctId": "NCT00000003", "officialTitle": "Official only"}
        }
    });
    let record = normalizer().normalize(&RawRecord::new(study)).unwrap().record;
    assert_eq!(record.title, "Official only");
}

#[test]
fn test_has_results_falls_back_to_results_section() {
    let mut study = minimal_study("NCT00000004");
    study["resultsSection"] = json!({"outcomeMeasuresModule": {"outcomeMeasures": []}});
    let record = normalizer().normalize(&RawRecord::new(study)).unwrap().record;
    assert!(record.has_results);
    assert_eq!(record.results.unwrap().outcome_measure_count, 0);
}

// =========================================================================
// Malformed records
// =========================================================================

#[test]
fn test_missing_protocol_section() {
    let err = normalizer()
        .normalize(&RawRecord::new(json!({"hasResults": false})))
        .unwrap_err();
    assert_eq!(err.field, "protocolSection");
    assert_eq!(err.reason, MalformedReason::Missing);
}

#[test]
fn test_missing_id() {
    let study = json!({"protocolSection": {"identificationModule": {"briefTitle": "No id"}}});
    let err = normalizer().normalize(&RawRecord::new(study)).unwrap_err();
    assert_eq!(err.field, "protocolSection.identificationModule.nctId");
    assert_eq!(err.reason, MalformedReason::Missing);
}

#[test]
fn test_non_string_id() {
    let study = json!({"protocolSection": {"identificationModule": {"nctId": 42, "briefTitle": "x"}}});
    let err = normalizer().normalize(&RawRecord::new(study)).unwrap_err();
    assert_eq!(err.reason, MalformedReason::WrongType("string".into()));
}

#[test]
fn test_blank_id() {
    let err = normalizer()
        .normalize(&RawRecord::new(minimal_study("  ")))
        .unwrap_err();
    assert_eq!(err.reason, MalformedReason::Empty);
}

#[test]
fn test_missing_title_carries_trial_id() {
    let study = json!({"protocolSection": {"identificationModule": {"nctId": "NCT00000005"}}});
    let err = normalizer().normalize(&RawRecord::new(study)).unwrap_err();
    assert_eq!(err.trial_id.as_deref(), Some("NCT00000005"));
    assert_eq!(err.field, "protocolSection.identificationModule.briefTitle");
}

// =========================================================================
// Warnings
// =========================================================================

#[test]
fn test_unparseable_date_is_warning_not_failure() {
    let mut study = minimal_study("NCT00000006");
    study["protocolSection"]["statusModule"] = json!({
        "overallStatus": "COMPLETED",
        "startDateStruct": {"date": "sometime in 2020", "type": "ACTUAL"},
        "completionDateStruct": {"date": "2021-01-01", "type": "ACTUAL"}
    });
    let normalized = normalizer().normalize(&RawRecord::new(study)).unwrap();

    assert!(normalized.record.start_date.is_none());
    assert!(normalized.record.duration.is_none());
    assert!(matches!(
        normalized.warnings.as_slice(),
        [RecordWarning::DateParse(err)] if err.field == "startDateStruct.date"
    ));
}

#[test]
fn test_unparseable_completion_leaves_duration_unclassified() {
    let mut study = minimal_study("NCT00000010");
    study["protocolSection"]["statusModule"] = json!({
        "overallStatus": "RECRUITING",
        "startDateStruct": {"date": "2023-01-01", "type": "ACTUAL"},
        "primaryCompletionDateStruct": {"date": "2025-03-01", "type": "ESTIMATED"},
        "completionDateStruct": {"date": "TBD", "type": "ESTIMATED"}
    });
    let normalized = normalizer().normalize(&RawRecord::new(study)).unwrap();

    assert!(normalized.record.start_date.is_some());
    assert!(normalized.record.completion_date.is_none());
    assert!(normalized.record.duration.is_none());
    assert!(matches!(
        normalized.warnings.as_slice(),
        [RecordWarning::DateParse(err)] if err.field == "completionDateStruct.date"
    ));
}

#[test]
fn test_wrong_typed_enrollment_and_results_flag_are_reported() {
    let mut study = minimal_study("NCT00000011");
    study["protocolSection"]["designModule"] = json!({
        "enrollmentInfo": {"count": "about 40", "type": "ESTIMATED"}
    });
    study["hasResults"] = json!("yes");
    let normalized = normalizer().normalize(&RawRecord::new(study)).unwrap();

    assert!(normalized.record.enrollment.is_none());
    assert!(!normalized.record.has_results);
    assert_eq!(
        normalized.warnings,
        vec![
            RecordWarning::UnrecognizedValue {
                field: "protocolSection.designModule.enrollmentInfo.count".to_string(),
                value: "\"about 40\"".to_string(),
            },
            RecordWarning::UnrecognizedValue {
                field: "hasResults".to_string(),
                value: "\"yes\"".to_string(),
            },
        ]
    );
}

#[test]
fn test_negative_duration_is_flagged() {
    let mut study = minimal_study("NCT00000007");
    study["protocolSection"]["statusModule"] = json!({
        "overallStatus": "COMPLETED",
        "startDateStruct": {"date": "2021-02-01", "type": "ACTUAL"},
        "completionDateStruct": {"date": "2021-01-01", "type": "ACTUAL"}
    });
    let normalized = normalizer().normalize(&RawRecord::new(study)).unwrap();

    assert_eq!(normalized.record.duration.unwrap().days, -31);
    assert_eq!(
        normalized.warnings,
        vec![RecordWarning::NegativeDuration { days: -31 }]
    );
}

#[test]
fn test_unrecognized_values_become_unknown() {
    let mut study = minimal_study("NCT00000008");
    study["protocolSection"]["statusModule"] = json!({"overallStatus": "PAUSED"});
    study["protocolSection"]["designModule"] = json!({"phases": ["PHASE9"]});
    let normalized = normalizer().normalize(&RawRecord::new(study)).unwrap();

    assert_eq!(normalized.record.status, TrialStatus::Unknown);
    assert_eq!(normalized.record.phase, Phase::Unknown);
    assert_eq!(normalized.warnings.len(), 2);

    let tagged: Vec<_> = normalized.aggregate_warnings().collect();
    assert!(tagged.iter().all(|w| w.to_string().starts_with("NCT00000008")));
}
