//! Internet search through the Serper Google Search API
//!
//! See: https://serper.dev

use crate::{Capability, Result, Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";

/// Number of organic results requested per query
pub const RESULT_COUNT: usize = 10;

/// Web search tool backed by Serper
pub struct WebSearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl WebSearch {
    pub const NAME: &'static str = "Search the internet";

    /// Create a search tool with the given Serper API key
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: SERPER_SEARCH_URL.to_string(),
        })
    }

    /// Use a different search endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run a search and return the raw organic results
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: RESULT_COUNT,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Api(format!("Serper returned {status}: {body}")));
        }

        let body: SearchResponse = response.json().await?;
        debug!(count = body.organic.len(), "Search results received");
        Ok(body.organic)
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn capability(&self) -> Capability {
        Capability::WebSearch
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search the internet for recent news and information. Input is a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("search query is empty".to_string()));
        }

        let results = self.search(query).await?;
        Ok(format_results(&results))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

/// One organic search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Render results as title/link/snippet blocks
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    results
        .iter()
        .map(|result| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}",
                result.title, result.link, result.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(SearchRequest {
            q: "AAPL earnings",
            num: RESULT_COUNT,
        })
        .unwrap();
        assert_eq!(body, json!({ "q": "AAPL earnings", "num": 10 }));
    }

    #[test]
    fn test_parse_and_format() {
        let raw = json!({
            "searchParameters": { "q": "AAPL" },
            "organic": [
                { "title": "Apple Q3", "link": "https://a.example", "snippet": "Revenue rose", "position": 1 },
                { "title": "Apple stock", "link": "https://b.example" }
            ]
        });
        let response: SearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.organic.len(), 2);
        assert_eq!(response.organic[1].snippet, "");

        let text = format_results(&response.organic);
        assert_eq!(
            text,
            "Title: Apple Q3\nLink: https://a.example\nSnippet: Revenue rose\n\n\
             Title: Apple stock\nLink: https://b.example\nSnippet: "
        );
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(format_results(&[]), "No results found.");
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let tool = WebSearch::new("key", Duration::from_secs(1)).unwrap();
        let err = tool.invoke("   ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
