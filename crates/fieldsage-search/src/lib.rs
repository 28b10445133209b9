//! Fieldsage Search Layer
//!
//! Grounding searches for the recommendation orchestrator. A search returns
//! free text plus the list of URLs it cited, and may be restricted to a
//! single domain.
//!
//! # Providers
//!
//! - `MockSearch`: Scripted results for testing
//! - `SonarSearch`: Chat-completions style search API with citations

#![warn(missing_docs)]

pub mod sonar;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use sonar::SonarSearch;

/// Errors that can occur during a search call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upstream answered 429
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Any other non-2xx answer
    #[error("Upstream HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
}

/// One search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Question to answer
    pub query: String,

    /// Restrict sources to this domain (and its subdomains)
    pub domain_filter: Option<String>,

    /// Instructions for the answering system
    pub instructions: String,
}

impl SearchQuery {
    /// Unrestricted query
    pub fn new(query: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain_filter: None,
            instructions: instructions.into(),
        }
    }

    /// Restrict the query to one domain
    pub fn restricted_to(mut self, domain: impl Into<String>) -> Self {
        self.domain_filter = Some(domain.into());
        self
    }
}

/// Answer text plus cited URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Free-text answer
    pub content: String,

    /// URLs the answer cites, in order
    pub citations: Vec<String>,
}

impl SearchResponse {
    /// Build a response
    pub fn new(content: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            content: content.into(),
            citations,
        }
    }
}

/// A web-search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;
}

type Rule = (Option<String>, String, Result<SearchResponse, SearchError>);

/// Scripted search backend for tests
///
/// Each rule matches on the domain filter (exact, `None` meaning
/// unrestricted) and a substring of the query; the first matching rule wins.
/// Unmatched queries get an empty response.
#[derive(Debug, Clone, Default)]
pub struct MockSearch {
    rules: Arc<Mutex<Vec<Rule>>>,
    seen: Arc<Mutex<Vec<SearchQuery>>>,
}

impl MockSearch {
    /// Mock with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `needle` under `domain_filter`
    pub fn with_result(
        self,
        domain_filter: Option<&str>,
        needle: &str,
        response: SearchResponse,
    ) -> Self {
        self.lock_rules()
            .push((domain_filter.map(str::to_string), needle.to_string(), Ok(response)));
        self
    }

    /// Fail queries containing `needle` under `domain_filter`
    pub fn with_error(self, domain_filter: Option<&str>, needle: &str, error: SearchError) -> Self {
        self.lock_rules()
            .push((domain_filter.map(str::to_string), needle.to_string(), Err(error)));
        self
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Number of search calls made so far
    pub fn call_count(&self) -> usize {
        self.queries().len()
    }

    fn lock_rules(&self) -> std::sync::MutexGuard<'_, Vec<Rule>> {
        self.rules.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(query.clone());

        let rules = self.lock_rules();
        let hit = rules.iter().find(|(domain, needle, _)| {
            *domain == query.domain_filter && query.query.contains(needle.as_str())
        });

        match hit {
            Some((_, _, result)) => result.clone(),
            None => Ok(SearchResponse::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_matches_domain_and_needle() {
        let search = MockSearch::new()
            .with_result(
                Some("mongodb.com"),
                "end of support",
                SearchResponse::new("2027-10-31", vec!["https://www.mongodb.com/x".into()]),
            )
            .with_result(None, "end of support", SearchResponse::new("third party", vec![]));

        let official = search
            .search(&SearchQuery::new("MongoDB end of support", "").restricted_to("mongodb.com"))
            .await
            .unwrap();
        assert_eq!(official.content, "2027-10-31");

        let open = search
            .search(&SearchQuery::new("MongoDB end of support", ""))
            .await
            .unwrap();
        assert_eq!(open.content, "third party");

        let miss = search.search(&SearchQuery::new("other", "")).await.unwrap();
        assert!(miss.citations.is_empty());
        assert_eq!(search.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_error_rule() {
        let search =
            MockSearch::new().with_error(None, "boom", SearchError::RateLimitExceeded);
        let result = search.search(&SearchQuery::new("boom", "")).await;
        assert_eq!(result, Err(SearchError::RateLimitExceeded));
    }
}
