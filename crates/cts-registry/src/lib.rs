//! ClinicalTrials.gov registry queries.
//!
//! [`QueryOrchestrator::query`] turns a disease term and a [`FilterSet`] into
//! a lazy stream of raw studies. Every request from every concurrent query
//! passes through one [`PacingGate`]; transient failures (timeouts, 5xx,
//! HTTP 429) are retried with bounded exponential backoff, and a term whose
//! retries run out ends with a [`QueryFailure`].
//!
//! The HTTP layer sits behind [`RegistryTransport`] so that pagination,
//! pacing and retry can be driven by an in-memory transport.
//!
//! [`FilterSet`]: cts_model::FilterSet

pub mod cancel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pacing;
pub mod request;
pub mod transport;

pub use cancel::CancelToken;
pub use config::{DateFilterMode, MAX_PAGE_SIZE, RegistryConfig, RetryPolicy};
pub use error::{QueryError, QueryFailure, Result};
pub use orchestrator::QueryOrchestrator;
pub use pacing::PacingGate;
pub use request::{PageRequest, passes_completion_filter, render_query};
pub use transport::{HttpTransport, PageResponse, RegistryTransport};
