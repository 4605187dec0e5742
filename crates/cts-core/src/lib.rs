//! Record normalization, duration classification and aggregation.
//!
//! Everything in this crate is synchronous and free of I/O. Problems with
//! individual records are returned as values ([`MalformedRecord`],
//! [`RecordWarning`]) for the caller to attach to an aggregate.
//!
//! [`MalformedRecord`]: cts_model::MalformedRecord

pub mod aggregate;
pub mod duration;
pub mod field;
pub mod normalize;

pub use aggregate::{AggregateBuilder, aggregate, duration_stats, failed, merge};
pub use duration::{DAYS_PER_MONTH, DAYS_PER_YEAR, compute_duration, duration_status};
pub use field::Field;
pub use normalize::{Normalized, RecordNormalizer, RecordWarning};
