//! Data model for clinical-trial registry statistics.
//!
//! Types here are plain data: the registry's categorical fields as enums,
//! partial-precision dates, normalized trial records, and the per-disease
//! and overall aggregates that form the pipeline's output.

pub mod aggregate;
pub mod date;
pub mod enums;
pub mod error;
pub mod query;
pub mod record;

pub use aggregate::{AggregateWarning, DiseaseAggregate, DurationStats, OverallAggregate, TermStatus};
pub use date::{DatePrecision, TrialDate, parse_partial_date};
pub use enums::{DateKind, DurationStatus, Phase, SponsorClass, StudyType, TrialStatus};
pub use error::{DateParseError, MalformedReason, MalformedRecord};
pub use query::FilterSet;
pub use record::{
    DurationResult, Enrollment, Outcomes, RawRecord, ResultsSummary, STUDY_URL_PREFIX, Sponsor,
    TrialRecord,
};
