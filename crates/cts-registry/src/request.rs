//! Page requests and the registry query syntax.

use chrono::NaiveDate;
use cts_model::FilterSet;

use crate::config::{DateFilterMode, RegistryConfig};

/// One page request, transport-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Rendered `query.term` value.
    pub query: String,
    pub page_size: u32,
    pub sort: String,
    /// Continuation token from the previous page; `None` for the first page.
    pub page_token: Option<String>,
}

impl PageRequest {
    /// Request for the first page of a term.
    pub fn first(config: &RegistryConfig, term: &str, filters: &FilterSet) -> Self {
        Self {
            query: render_query(term, filters, config.date_filter),
            page_size: config.effective_page_size(),
            sort: config.sort.clone(),
            page_token: None,
        }
    }

    /// Same query, continued from `token`.
    #[must_use]
    pub fn next(&self, token: String) -> Self {
        Self {
            page_token: Some(token),
            ..self.clone()
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.page_token.is_none()
    }

    /// Query-string parameters in a stable order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query.term", self.query.clone()),
            ("pageSize", self.page_size.to_string()),
            ("sort", self.sort.clone()),
            ("format", "json".to_string()),
        ];
        match &self.page_token {
            Some(token) => params.push(("pageToken", token.clone())),
            None => params.push(("countTotal", "true".to_string())),
        }
        params
    }
}

/// Build the registry search expression for a term.
///
/// The term is quoted; each filter is appended with `AND AREA[...]`. The
/// completion bound is only rendered in server mode.
pub fn render_query(term: &str, filters: &FilterSet, mode: DateFilterMode) -> String {
    let mut query = format!("\"{}\"", term.trim().replace('"', ""));
    if let Some(study_type) = filters.study_type {
        query.push_str(&format!(" AND AREA[StudyType]{}", study_type.query_value()));
    }
    if let Some(sponsor_class) = filters.sponsor_class {
        query.push_str(&format!(
            " AND AREA[LeadSponsorClass]{}",
            sponsor_class.query_value()
        ));
    }
    if let (DateFilterMode::Server, Some(after)) = (mode, filters.completed_after) {
        query.push_str(&format!(
            " AND AREA[CompletionDate]RANGE[{},MAX]",
            after.format("%Y-%m-%d")
        ));
    }
    query
}

/// Client-side completion cutoff.
///
/// Drops a record only when its completion date parses and falls before
/// `after`; missing or unparseable dates are kept.
pub fn passes_completion_filter(completion: Option<&str>, after: NaiveDate) -> bool {
    completion
        .and_then(cts_model::parse_partial_date)
        .is_none_or(|(date, _)| date >= after)
}
