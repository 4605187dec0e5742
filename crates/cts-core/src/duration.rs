//! Trial duration classification.
//!
//! Pure and deterministic: the reference date is an input, never read from
//! the clock.
//!
//! Rules, first match wins:
//!
//! 1. Terminal status with start and completion dates: `ACTUAL`, start to
//!    completion.
//! 2. Start date and an estimated completion (completion preferred over
//!    primary completion): `EXPECTED`, start to that date.
//! 3. Active status with a start date and no completion date: `ONGOING`,
//!    start to the reference date.
//! 4. Otherwise `UNKNOWN`, with no numeric duration.
//!
//! Partial dates are already anchored to the first day of their period by
//! [`TrialDate`]. Negative spans are returned as-is.

use chrono::NaiveDate;
use cts_model::{DurationResult, DurationStatus, TrialDate, TrialStatus};

/// Average days per month used for unit conversion.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Average days per year used for unit conversion.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Classify a trial's duration from its dates and status.
///
/// Returns `None` for `UNKNOWN`; every returned result has a non-`UNKNOWN`
/// status and a numeric duration.
pub fn compute_duration(
    start: Option<&TrialDate>,
    primary_completion: Option<&TrialDate>,
    completion: Option<&TrialDate>,
    status: TrialStatus,
    today: NaiveDate,
) -> Option<DurationResult> {
    let start = start?;

    if status.is_terminal() {
        if let Some(end) = completion {
            return Some(span(start.value, end.value, DurationStatus::Actual));
        }
    }

    let estimated = completion
        .filter(|d| d.is_estimated())
        .or_else(|| primary_completion.filter(|d| d.is_estimated()));
    if let Some(end) = estimated {
        return Some(span(start.value, end.value, DurationStatus::Expected));
    }

    if status.is_active() && completion.is_none() {
        return Some(span(start.value, today, DurationStatus::Ongoing));
    }

    None
}

/// Status for a possibly-absent duration.
pub fn duration_status(duration: Option<&DurationResult>) -> DurationStatus {
    duration.map_or(DurationStatus::Unknown, |d| d.status)
}

fn span(from: NaiveDate, to: NaiveDate, status: DurationStatus) -> DurationResult {
    let days = (to - from).num_days();
    DurationResult {
        days,
        months: round_to(days as f64 / DAYS_PER_MONTH, 1),
        years: round_to(days as f64 / DAYS_PER_YEAR, 2),
        status,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
