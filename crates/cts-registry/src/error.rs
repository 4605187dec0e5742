//! Error types for registry queries.

use std::time::Duration;

use thiserror::Error;

/// A single request to the registry failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// No response within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure; no response was received.
    #[error("network error: {0}")]
    Network(String),

    /// Registry returned a 5xx status.
    #[error("registry server error (HTTP {status})")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// Registry returned HTTP 429.
    #[error("registry rate limit exceeded")]
    RateLimitExceeded {
        /// Delay requested by the `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// Registry rejected the request (4xx other than 429).
    #[error("registry rejected the request (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    /// Response body was not a registry page.
    #[error("could not decode registry response: {0}")]
    Decode(String),

    /// Client settings are unusable (bad URL, header or TLS setup).
    #[error("invalid registry client configuration: {0}")]
    Config(String),

    /// The run was cancelled before the request was sent.
    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    /// Returns a short message suitable for a summary table.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Timeout(_) | Self::Network(_) => {
                "Could not reach the registry. Please check your internet connection."
            }
            Self::Server { .. } => "The registry is temporarily unavailable.",
            Self::RateLimitExceeded { .. } => "The registry rate limit was reached.",
            Self::Http { .. } => "The registry rejected the query.",
            Self::Decode(_) => "The registry returned an unexpected response.",
            Self::Config(_) => "The registry client is misconfigured.",
            Self::Cancelled => "The query was cancelled.",
        }
    }

    /// Returns whether a retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::Server { .. } | Self::RateLimitExceeded { .. }
        )
    }

    /// Returns whether the registry answered with a status or body.
    #[must_use]
    pub fn is_registry_response(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::RateLimitExceeded { .. } | Self::Http { .. } | Self::Decode(_)
        )
    }

    /// Returns whether the registry was never reached.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A disease term's query failed; other terms are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query for '{term}' failed after {attempts} attempt(s): {source}")]
pub struct QueryFailure {
    pub term: String,
    /// Requests sent for the failing page, including the first.
    pub attempts: u32,
    /// Whether the registry answered at all during this query: an earlier
    /// page, or an HTTP-level error on the failing one.
    pub responded: bool,
    #[source]
    pub source: QueryError,
}

impl QueryFailure {
    pub fn new(term: impl Into<String>, attempts: u32, source: QueryError) -> Self {
        Self {
            term: term.into(),
            attempts,
            responded: false,
            source,
        }
    }

    #[must_use]
    pub fn with_responded(mut self, responded: bool) -> Self {
        self.responded = responded;
        self
    }

    /// True when the registry never answered: every attempt failed at the
    /// connection level and no earlier page arrived.
    pub fn is_unreachable(&self) -> bool {
        !self.responded && self.source.is_connectivity()
    }

    /// Failure recorded for a term that never ran because of cancellation.
    pub fn cancelled(term: impl Into<String>) -> Self {
        Self::new(term, 0, QueryError::Cancelled)
    }
}

/// Result type alias for single registry requests.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(QueryError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(QueryError::Network("connection refused".to_string()).is_retryable());
        assert!(QueryError::Server { status: 503 }.is_retryable());
        assert!(QueryError::RateLimitExceeded { retry_after: None }.is_retryable());
        assert!(
            !QueryError::Http {
                status: 400,
                body: "bad query".to_string()
            }
            .is_retryable()
        );
        assert!(!QueryError::Decode("eof".to_string()).is_retryable());
        assert!(!QueryError::Config("invalid user agent".to_string()).is_retryable());
        assert!(!QueryError::Cancelled.is_retryable());
    }

    #[test]
    fn test_connectivity() {
        assert!(QueryError::Timeout(Duration::from_secs(1)).is_connectivity());
        assert!(!QueryError::Server { status: 500 }.is_connectivity());
        assert!(!QueryError::Config("invalid registry URL".to_string()).is_connectivity());
    }

    #[test]
    fn test_unreachable_requires_no_response() {
        let timeout = QueryError::Timeout(Duration::from_secs(30));
        assert!(QueryFailure::new("asthma", 4, timeout.clone()).is_unreachable());
        assert!(
            !QueryFailure::new("asthma", 1, timeout)
                .with_responded(true)
                .is_unreachable()
        );
        let rejected = QueryError::Http {
            status: 400,
            body: String::new(),
        };
        assert!(!QueryFailure::new("asthma", 1, rejected).is_unreachable());
    }

    #[test]
    fn test_failure_message() {
        let failure = QueryFailure::new("asthma", 4, QueryError::Server { status: 502 });
        assert_eq!(
            failure.to_string(),
            "query for 'asthma' failed after 4 attempt(s): registry server error (HTTP 502)"
        );
        assert!(failure.source.user_message().contains("temporarily"));
    }
}
