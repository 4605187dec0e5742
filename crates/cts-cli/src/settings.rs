//! Run settings loaded from a TOML file.
//!
//! ```toml
//! [registry]
//! page_size = 100
//! rate_limit_delay_ms = 1000
//! date_filter = "client"
//!
//! [registry.retry]
//! max_retries = 3
//!
//! [filters]
//! apply = true
//! study_type = "INTERVENTIONAL"
//! sponsor_class = "INDUSTRY"
//! years_back = 10
//!
//! [run]
//! workers = 4
//! retain_raw = false
//! ```
//!
//! Every field is optional; a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use cts_model::{FilterSet, SponsorClass, StudyType};
use cts_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "cts.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Default query filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// When false, terms are queried unfiltered.
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_type: Option<StudyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_class: Option<SponsorClass>,
    /// Completion-date window, in years before the run date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_back: Option<u32>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            apply: true,
            study_type: Some(StudyType::Interventional),
            sponsor_class: Some(SponsorClass::Industry),
            years_back: Some(10),
        }
    }
}

impl FilterSettings {
    /// Resolve into the filter set used for every term of a run.
    ///
    /// `years_back` becomes `today - years_back * 365 days`.
    pub fn resolve(&self, today: NaiveDate) -> FilterSet {
        if !self.apply {
            return FilterSet::unfiltered();
        }
        FilterSet {
            study_type: self.study_type,
            sponsor_class: self.sponsor_class,
            completed_after: self
                .years_back
                .and_then(|years| today.checked_sub_days(Days::new(u64::from(years) * 365))),
        }
    }
}

/// Scheduling options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Terms processed concurrently.
    pub workers: usize,
    /// Keep raw registry payloads in the run report.
    pub retain_raw: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            retain_raw: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistryConfig,
    pub filters: FilterSettings,
    pub run: RunSettings,
}

impl Settings {
    /// Load settings from `path`. The file must exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match Self::load(path) {
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |message: &str| Err(SettingsError::Invalid(message.to_string()));
        if self.registry.page_size == 0 {
            return invalid("registry.page_size must be at least 1");
        }
        if self.registry.max_records == 0 {
            return invalid("registry.max_records must be at least 1");
        }
        if self.registry.retry.multiplier < 1.0 {
            return invalid("registry.retry.multiplier must be at least 1.0");
        }
        if self.registry.request_timeout_ms == 0 {
            return invalid("registry.request_timeout_ms must be at least 1");
        }
        if self.run.workers == 0 {
            return invalid("run.workers must be at least 1");
        }
        Ok(())
    }
}
