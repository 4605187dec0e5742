//! Query inputs: disease terms and their filters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{SponsorClass, StudyType};

/// Optional query filters. An absent field means "unfiltered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_type: Option<StudyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_class: Option<SponsorClass>,
    /// Lower bound (inclusive) on the trial completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_after: Option<NaiveDate>,
}

impl FilterSet {
    /// No filtering at all.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// Returns true when no filter field is set.
    pub fn is_empty(&self) -> bool {
        self.study_type.is_none() && self.sponsor_class.is_none() && self.completed_after.is_none()
    }

    #[must_use]
    pub fn with_study_type(mut self, study_type: StudyType) -> Self {
        self.study_type = Some(study_type);
        self
    }

    #[must_use]
    pub fn with_sponsor_class(mut self, sponsor_class: SponsorClass) -> Self {
        self.sponsor_class = Some(sponsor_class);
        self
    }

    #[must_use]
    pub fn with_completed_after(mut self, date: NaiveDate) -> Self {
        self.completed_after = Some(date);
        self
    }
}
