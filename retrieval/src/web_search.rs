//! Web search collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Default Tavily endpoint.
pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Bounds applied to the requested result count.
const MIN_RESULTS: usize = 1;
const MAX_RESULTS: usize = 10;

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Searches the web for research material.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Search for `query`, returning at most `max_results` hits in rank
    /// order. Unauthenticated providers return nothing.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSearchResult>>;
}

/// Tavily search API client.
pub struct TavilySearch {
    /// API key.
    api_key: Option<String>,

    /// Search endpoint.
    endpoint: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            endpoint: TAVILY_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl WebSearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSearchResult>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No web search key configured");
            return Ok(Vec::new());
        };

        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": max_results.clamp(MIN_RESULTS, MAX_RESULTS),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Web search returned {}", response.status());
            return Ok(Vec::new());
        }

        let data: TavilyResponse = response.json().await?;
        Ok(data.results)
    }
}

/// Tavily API response format.
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<WebSearchResult>,
}
