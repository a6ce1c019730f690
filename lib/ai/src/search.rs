//! Web search client.
//!
//! Search is a best-effort enrichment: callers degrade failures into tool
//! error payloads rather than aborting the turn.

use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Maximum number of results returned per query.
pub const RESULT_CAP: usize = 4;

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Short text excerpt.
    pub snippet: String,
    /// Result URL.
    pub link: String,
}

/// Trait for web search providers.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Runs a query and returns at most [`RESULT_CAP`] results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, HTTP, or parse failure.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Configuration for the Serper search provider.
#[derive(Debug, Clone)]
pub struct SerperConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// API key sent in the `X-API-KEY` header.
    pub api_key: String,
}

/// Search client backed by the Serper API.
pub struct SerperSearch {
    config: SerperConfig,
    client: reqwest::Client,
}

impl SerperSearch {
    /// Creates a client from configuration.
    #[must_use]
    pub fn new(config: SerperConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchClient for SerperSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await
            .map_err(|e| SearchError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: SerperResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        Ok(cap_results(parsed))
    }
}

fn cap_results(response: SerperResponse) -> Vec<SearchResult> {
    response
        .organic
        .into_iter()
        .take(RESULT_CAP)
        .map(|entry| SearchResult {
            title: entry.title,
            snippet: entry.snippet.unwrap_or_default(),
            link: entry.link,
        })
        .collect()
}

/// Serper response wire format.
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperEntry>,
}

#[derive(Debug, Deserialize)]
struct SerperEntry {
    title: String,
    #[serde(default)]
    snippet: Option<String>,
    link: String,
}
