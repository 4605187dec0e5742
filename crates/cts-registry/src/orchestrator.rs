//! Per-term paginated queries.

use std::sync::Arc;

use async_stream::stream;
use cts_model::{FilterSet, RawRecord};
use futures_util::Stream;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{DateFilterMode, RegistryConfig};
use crate::error::{QueryError, QueryFailure};
use crate::pacing::PacingGate;
use crate::request::{PageRequest, passes_completion_filter};
use crate::transport::{HttpTransport, PageResponse, RegistryTransport};

const COMPLETION_DATE: &str = "/protocolSection/statusModule/completionDateStruct/date";

/// Issues paced, retried, paginated queries against the registry.
///
/// Cloning is cheap and clones share the pacing gate and cancel token, so
/// every query started from any clone is paced as one stream of requests.
#[derive(Clone)]
pub struct QueryOrchestrator {
    config: Arc<RegistryConfig>,
    transport: Arc<dyn RegistryTransport>,
    gate: Arc<PacingGate>,
    cancel: CancelToken,
}

impl std::fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl QueryOrchestrator {
    pub fn new(config: Arc<RegistryConfig>, transport: Arc<dyn RegistryTransport>) -> Self {
        let gate = Arc::new(PacingGate::new(config.rate_limit_delay()));
        Self {
            config,
            transport,
            gate,
            cancel: CancelToken::new(),
        }
    }

    /// Orchestrator over the HTTP transport.
    pub fn http(config: RegistryConfig) -> Result<Self, QueryError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(config), Arc::new(transport)))
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Lazily fetch up to `max_records` raw studies for `term`.
    ///
    /// Records are yielded in registry order. The stream is single-pass:
    /// calling `query` again issues fresh requests. A failure is yielded
    /// once as the last item.
    pub fn query(
        &self,
        term: &str,
        filters: &FilterSet,
        max_records: usize,
    ) -> impl Stream<Item = Result<RawRecord, QueryFailure>> + Send + 'static {
        let this = self.clone();
        let term = term.to_string();
        let mut request = PageRequest::first(&self.config, &term, filters);
        let cutoff = match self.config.date_filter {
            DateFilterMode::Client => filters.completed_after,
            DateFilterMode::Server => None,
        };

        stream! {
            let mut fetched = 0usize;
            let mut filtered_out = 0usize;
            let mut page = 0u32;

            while fetched < max_records {
                page += 1;
                let response = match this.fetch_with_retry(&term, &request, page).await {
                    Ok(response) => response,
                    Err(failure) => {
                        let responded = failure.responded || page > 1;
                        yield Err(failure.with_responded(responded));
                        return;
                    }
                };
                let PageResponse {
                    studies,
                    next_page_token,
                    total_count,
                } = response;

                if let Some(total) = total_count {
                    info!(term = %term, total, "registry reports matching studies");
                }
                debug!(term = %term, page, records = studies.len(), "page received");

                let page_was_empty = studies.is_empty();
                let take = studies.len().min(max_records - fetched);
                fetched += take;

                for raw in studies.into_iter().take(take) {
                    if let Some(after) = cutoff {
                        let completion = raw.pointer(COMPLETION_DATE).and_then(Value::as_str);
                        if !passes_completion_filter(completion, after) {
                            filtered_out += 1;
                            continue;
                        }
                    }
                    yield Ok(raw);
                }

                match next_page_token {
                    Some(token) if !page_was_empty => request = request.next(token),
                    _ => break,
                }
            }

            debug!(term = %term, pages = page, fetched, filtered_out, "query finished");
        }
    }

    /// One page, through the pacing gate, with timeout and bounded retry.
    async fn fetch_with_retry(
        &self,
        term: &str,
        request: &PageRequest,
        page: u32,
    ) -> Result<PageResponse, QueryFailure> {
        let policy = &self.config.retry;
        let timeout = self.config.request_timeout();
        let mut attempts = 0u32;
        let mut answered = false;

        loop {
            if self.cancel.is_cancelled() {
                let failure = QueryFailure::new(term, attempts, QueryError::Cancelled);
                return Err(failure.with_responded(answered));
            }
            self.gate.wait().await;
            if self.cancel.is_cancelled() {
                let failure = QueryFailure::new(term, attempts, QueryError::Cancelled);
                return Err(failure.with_responded(answered));
            }
            attempts += 1;

            let result = tokio::time::timeout(timeout, self.transport.fetch_page(request))
                .await
                .unwrap_or(Err(QueryError::Timeout(timeout)));

            let err = match result {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            answered |= err.is_registry_response();

            if !err.is_retryable() || attempts >= policy.max_attempts() {
                warn!(term, page, attempts, error = %err, "registry request failed");
                return Err(QueryFailure::new(term, attempts, err).with_responded(answered));
            }

            let mut delay = policy.backoff(attempts);
            if let QueryError::RateLimitExceeded {
                retry_after: Some(retry_after),
            } = &err
            {
                delay = delay.max(*retry_after);
            }
            warn!(
                term,
                page,
                attempt = attempts,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "retrying registry request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
