//! Page transport: the seam between pagination logic and HTTP.

use std::time::Duration;

use async_trait::async_trait;
use cts_model::RawRecord;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::RegistryConfig;
use crate::error::{QueryError, Result};
use crate::request::PageRequest;

/// Longest error body kept in [`QueryError::Http`].
const MAX_ERROR_BODY: usize = 500;

/// One page of studies as returned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    pub studies: Vec<RawRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Only reported on the first page.
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Fetches single pages. Pacing, timeouts and retries are applied by the
/// caller, not the transport.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse>;
}

/// HTTP transport for the registry v2 API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    studies_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| QueryError::Config(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| QueryError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            studies_url: config.studies_url(),
            timeout: config.request_timeout(),
        })
    }

    fn url(&self, request: &PageRequest) -> Result<Url> {
        Url::parse_with_params(&self.studies_url, request.params())
            .map_err(|e| QueryError::Config(format!("invalid registry URL: {e}")))
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<PageResponse> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(QueryError::RateLimitExceeded { retry_after });
        }

        if status.is_server_error() {
            return Err(QueryError::Server {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(QueryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(&e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn map_error(&self, err: &reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout(self.timeout)
        } else if err.is_decode() {
            QueryError::Decode(err.to_string())
        } else {
            QueryError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse> {
        let url = self.url(request)?;
        tracing::debug!(%url, "GET registry page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;
        self.handle_response(response).await
    }
}
