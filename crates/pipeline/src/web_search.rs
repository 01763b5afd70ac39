//! Web search adapter.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use taxgpt_core::{AppError, AppResult};

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Missing or null content decodes as empty and is skipped when merging.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Snippet {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            url: None,
            title: None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// General web search, best result first.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<Snippet>>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<Snippet>,
}

/// Tavily search API client.
pub struct TavilySearch {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl TavilySearch {
    /// A missing API key is not an error here; every search then fails and
    /// the pipeline carries on without web context.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::WebSearch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<Snippet>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::WebSearch("No web search API key configured".to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, max_results, "Running web search");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TavilyRequest {
                api_key,
                query,
                max_results,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("Web search: {}", e))
                } else {
                    AppError::WebSearch(format!("Failed to reach web search: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::WebSearch(format!(
                "Web search error ({}): {}",
                status, error_text
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::WebSearch(format!("Invalid web search response: {}", e)))?;

        let mut results = body.results;
        results.truncate(max_results);
        Ok(results)
    }
}
