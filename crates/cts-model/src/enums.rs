//! Type-safe enumerations for registry categorical fields.
//!
//! The registry encodes these as `SCREAMING_SNAKE_CASE` strings. Every enum
//! that can be missing or unrecognized in source data carries an explicit
//! `Unknown` variant, so "not reported" is never confused with a real value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall recruitment status of a study.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialStatus {
    NotYetRecruiting,
    Recruiting,
    EnrollingByInvitation,
    ActiveNotRecruiting,
    Suspended,
    Terminated,
    Completed,
    Withdrawn,
    Available,
    NoLongerAvailable,
    TemporarilyNotAvailable,
    ApprovedForMarketing,
    Withheld,
    /// Status missing from the record or not recognized.
    Unknown,
}

impl TrialStatus {
    /// Returns the registry code for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::NotYetRecruiting => "NOT_YET_RECRUITING",
            TrialStatus::Recruiting => "RECRUITING",
            TrialStatus::EnrollingByInvitation => "ENROLLING_BY_INVITATION",
            TrialStatus::ActiveNotRecruiting => "ACTIVE_NOT_RECRUITING",
            TrialStatus::Suspended => "SUSPENDED",
            TrialStatus::Terminated => "TERMINATED",
            TrialStatus::Completed => "COMPLETED",
            TrialStatus::Withdrawn => "WITHDRAWN",
            TrialStatus::Available => "AVAILABLE",
            TrialStatus::NoLongerAvailable => "NO_LONGER_AVAILABLE",
            TrialStatus::TemporarilyNotAvailable => "TEMPORARILY_NOT_AVAILABLE",
            TrialStatus::ApprovedForMarketing => "APPROVED_FOR_MARKETING",
            TrialStatus::Withheld => "WITHHELD",
            TrialStatus::Unknown => "UNKNOWN",
        }
    }

    /// Returns true for states in which the study has stopped for good.
    ///
    /// Suspended studies may resume, so they are not terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrialStatus::Completed | TrialStatus::Terminated | TrialStatus::Withdrawn
        )
    }

    /// Returns true for studies that have started and are still running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TrialStatus::Recruiting
                | TrialStatus::EnrollingByInvitation
                | TrialStatus::ActiveNotRecruiting
        )
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_code(s).as_str() {
            "NOT_YET_RECRUITING" => Ok(TrialStatus::NotYetRecruiting),
            "RECRUITING" => Ok(TrialStatus::Recruiting),
            "ENROLLING_BY_INVITATION" => Ok(TrialStatus::EnrollingByInvitation),
            "ACTIVE_NOT_RECRUITING" => Ok(TrialStatus::ActiveNotRecruiting),
            "SUSPENDED" => Ok(TrialStatus::Suspended),
            "TERMINATED" => Ok(TrialStatus::Terminated),
            "COMPLETED" => Ok(TrialStatus::Completed),
            "WITHDRAWN" => Ok(TrialStatus::Withdrawn),
            "AVAILABLE" => Ok(TrialStatus::Available),
            "NO_LONGER_AVAILABLE" => Ok(TrialStatus::NoLongerAvailable),
            "TEMPORARILY_NOT_AVAILABLE" => Ok(TrialStatus::TemporarilyNotAvailable),
            "APPROVED_FOR_MARKETING" => Ok(TrialStatus::ApprovedForMarketing),
            "WITHHELD" => Ok(TrialStatus::Withheld),
            "UNKNOWN" => Ok(TrialStatus::Unknown),
            _ => Err(format!("Unknown trial status: {s}")),
        }
    }
}

/// Clinical-trial phase designation.
///
/// Combined phases (e.g. Phase 1/2) are reported by the registry as a list
/// of two phases and collapse into a single variant here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    EarlyPhase1,
    Phase1,
    Phase1Phase2,
    Phase2,
    Phase2Phase3,
    Phase3,
    Phase4,
    /// Trials without FDA-defined phases (e.g. device or behavioral studies).
    #[serde(rename = "NA")]
    NotApplicable,
    Unknown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::EarlyPhase1 => "EARLY_PHASE1",
            Phase::Phase1 => "PHASE1",
            Phase::Phase1Phase2 => "PHASE1_PHASE2",
            Phase::Phase2 => "PHASE2",
            Phase::Phase2Phase3 => "PHASE2_PHASE3",
            Phase::Phase3 => "PHASE3",
            Phase::Phase4 => "PHASE4",
            Phase::NotApplicable => "NA",
            Phase::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::EarlyPhase1 => "Early Phase 1",
            Phase::Phase1 => "Phase 1",
            Phase::Phase1Phase2 => "Phase 1/2",
            Phase::Phase2 => "Phase 2",
            Phase::Phase2Phase3 => "Phase 2/3",
            Phase::Phase3 => "Phase 3",
            Phase::Phase4 => "Phase 4",
            Phase::NotApplicable => "N/A",
            Phase::Unknown => "Unknown",
        }
    }

    /// Collapse a registry phase list into one designation.
    ///
    /// Returns `None` when the list contains an unrecognized code or a
    /// combination the registry does not define.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Option<Phase> {
        let mut parsed: Vec<Phase> = Vec::with_capacity(codes.len());
        for code in codes {
            parsed.push(code.as_ref().parse().ok()?);
        }
        parsed.sort();
        parsed.dedup();
        match parsed.as_slice() {
            [] => Some(Phase::Unknown),
            [single] => Some(*single),
            [Phase::Phase1, Phase::Phase2] => Some(Phase::Phase1Phase2),
            [Phase::Phase2, Phase::Phase3] => Some(Phase::Phase2Phase3),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_code(s).as_str() {
            "EARLY_PHASE1" => Ok(Phase::EarlyPhase1),
            "PHASE1" => Ok(Phase::Phase1),
            "PHASE1_PHASE2" => Ok(Phase::Phase1Phase2),
            "PHASE2" => Ok(Phase::Phase2),
            "PHASE2_PHASE3" => Ok(Phase::Phase2Phase3),
            "PHASE3" => Ok(Phase::Phase3),
            "PHASE4" => Ok(Phase::Phase4),
            "NA" => Ok(Phase::NotApplicable),
            "UNKNOWN" => Ok(Phase::Unknown),
            _ => Err(format!("Unknown phase: {s}")),
        }
    }
}

/// Categorical funder type of the lead sponsor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SponsorClass {
    Industry,
    Nih,
    Fed,
    OtherGov,
    Indiv,
    Network,
    Ambig,
    Other,
    Unknown,
}

impl SponsorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SponsorClass::Industry => "INDUSTRY",
            SponsorClass::Nih => "NIH",
            SponsorClass::Fed => "FED",
            SponsorClass::OtherGov => "OTHER_GOV",
            SponsorClass::Indiv => "INDIV",
            SponsorClass::Network => "NETWORK",
            SponsorClass::Ambig => "AMBIG",
            SponsorClass::Other => "OTHER",
            SponsorClass::Unknown => "UNKNOWN",
        }
    }

    /// Value used inside `AREA[LeadSponsorClass]` query expressions.
    pub fn query_value(&self) -> &'static str {
        match self {
            SponsorClass::Industry => "Industry",
            SponsorClass::Nih => "NIH",
            SponsorClass::Fed => "FED",
            SponsorClass::OtherGov => "OTHER_GOV",
            SponsorClass::Indiv => "INDIV",
            SponsorClass::Network => "NETWORK",
            SponsorClass::Ambig => "AMBIG",
            SponsorClass::Other => "OTHER",
            SponsorClass::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SponsorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SponsorClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_code(s).as_str() {
            "INDUSTRY" => Ok(SponsorClass::Industry),
            "NIH" => Ok(SponsorClass::Nih),
            "FED" => Ok(SponsorClass::Fed),
            "OTHER_GOV" => Ok(SponsorClass::OtherGov),
            "INDIV" => Ok(SponsorClass::Indiv),
            "NETWORK" => Ok(SponsorClass::Network),
            "AMBIG" => Ok(SponsorClass::Ambig),
            "OTHER" => Ok(SponsorClass::Other),
            "UNKNOWN" => Ok(SponsorClass::Unknown),
            _ => Err(format!("Unknown sponsor class: {s}")),
        }
    }
}

/// Study design type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyType {
    Interventional,
    Observational,
    ExpandedAccess,
    Unknown,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::Interventional => "INTERVENTIONAL",
            StudyType::Observational => "OBSERVATIONAL",
            StudyType::ExpandedAccess => "EXPANDED_ACCESS",
            StudyType::Unknown => "UNKNOWN",
        }
    }

    /// Value used inside `AREA[StudyType]` query expressions.
    pub fn query_value(&self) -> &'static str {
        match self {
            StudyType::Interventional => "Interventional",
            StudyType::Observational => "Observational",
            StudyType::ExpandedAccess => "Expanded Access",
            StudyType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_code(s).as_str() {
            "INTERVENTIONAL" => Ok(StudyType::Interventional),
            "OBSERVATIONAL" => Ok(StudyType::Observational),
            "EXPANDED_ACCESS" => Ok(StudyType::ExpandedAccess),
            "UNKNOWN" => Ok(StudyType::Unknown),
            _ => Err(format!("Unknown study type: {s}")),
        }
    }
}

/// Whether a date (or enrollment count) is observed or anticipated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateKind {
    Actual,
    Estimated,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKind::Actual => "ACTUAL",
            DateKind::Estimated => "ESTIMATED",
        }
    }
}

impl fmt::Display for DateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy records use ANTICIPATED for estimated dates.
        match normalize_code(s).as_str() {
            "ACTUAL" => Ok(DateKind::Actual),
            "ESTIMATED" | "ANTICIPATED" => Ok(DateKind::Estimated),
            _ => Err(format!("Unknown date type: {s}")),
        }
    }
}

/// How a trial's duration was derived.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationStatus {
    /// Completed trial with actual start and completion dates.
    Actual,
    /// Duration to an estimated completion date.
    Expected,
    /// Running trial, measured up to the reference date.
    Ongoing,
    /// Duration could not be determined.
    Unknown,
}

impl DurationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationStatus::Actual => "ACTUAL",
            DurationStatus::Expected => "EXPECTED",
            DurationStatus::Ongoing => "ONGOING",
            DurationStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Uppercase and map separators so "Active, not recruiting" and
/// "ACTIVE_NOT_RECRUITING" parse the same way.
fn normalize_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_sep = true;
    for ch in s.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
            last_sep = false;
        } else if ch == '/' {
            // "PHASE1/PHASE2" -> "PHASE1_PHASE2"
            if !last_sep {
                out.push('_');
                last_sep = true;
            }
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
