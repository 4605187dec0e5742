//! Registry client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Largest page the registry serves.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Registry v2 API root.
pub const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov/api/v2";

/// Most recently updated studies first.
pub const DEFAULT_SORT: &str = "LastUpdatePostDate:desc";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("cts/", env!("CARGO_PKG_VERSION"));

/// Where the completion-date lower bound is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilterMode {
    /// Sent to the registry as a `CompletionDate` range.
    Server,
    /// Applied to each record before it is yielded.
    #[default]
    Client,
}

impl DateFilterMode {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for DateFilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let millis = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Total attempts including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Connection and paging settings for the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    /// Records per page, capped at [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Default cap on records fetched per term.
    pub max_records: usize,
    /// Minimum spacing between any two outbound requests.
    pub rate_limit_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub sort: String,
    pub date_filter: DateFilterMode,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 100,
            max_records: 1000,
            rate_limit_delay_ms: 1000,
            request_timeout_ms: 30_000,
            sort: DEFAULT_SORT.to_string(),
            date_filter: DateFilterMode::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Studies endpoint URL.
    #[must_use]
    pub fn studies_url(&self) -> String {
        format!("{}/studies", self.base_url.trim_end_matches('/'))
    }
}
