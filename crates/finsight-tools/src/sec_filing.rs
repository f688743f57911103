//! Keyword search inside a company's latest SEC 10-K or 10-Q filing
//!
//! The filing is located through the sec-api.io query endpoint, then the
//! document itself is downloaded from sec.gov. SEC fair-access rules require
//! a descriptive User-Agent with contact details and at most 10 requests per
//! second.
//!
//! Cleaned filing text is cached per ticker for the life of the tool, so a
//! run that asks several questions about one company downloads it once.

use crate::{Capability, Result, Tool, ToolError};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SEC_QUERY_URL: &str = "https://api.sec-api.io";

/// SEC fair-access limit
const SEC_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Words per passage
const PASSAGE_WORDS: usize = 120;

/// Passages returned per query
const TOP_PASSAGES: usize = 3;

static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s\.\,\;\:\!\?\$\%\(\)\-\+\=\[\]"'/\\]"#)
        .unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|e| unreachable!("static pattern: {e}")));

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "what", "with", "from", "that", "this", "how", "does",
    "its", "their", "about", "into", "any", "has", "have", "which", "who", "why", "when",
];

/// SEC periodic report form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingForm {
    /// Annual report
    #[serde(rename = "10-K")]
    Form10K,
    /// Quarterly report
    #[serde(rename = "10-Q")]
    Form10Q,
}

impl FilingForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingForm::Form10K => "10-K",
            FilingForm::Form10Q => "10-Q",
        }
    }

    /// Stable tool name for this form
    pub fn tool_name(&self) -> &'static str {
        match self {
            FilingForm::Form10K => "Search SEC 10-K Filing",
            FilingForm::Form10Q => "Search SEC 10-Q Filing",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            FilingForm::Form10K => {
                "Search within a company's latest 10-K SEC filing. \
                 Input format: \"TICKER: what to look for\", e.g. \"AAPL: risk factors\"."
            }
            FilingForm::Form10Q => {
                "Search within a company's latest 10-Q SEC filing. \
                 Input format: \"TICKER: what to look for\", e.g. \"MSFT: quarterly revenue\"."
            }
        }
    }
}

impl fmt::Display for FilingForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Searches a company's latest filing of one form
pub struct SecFilingSearch {
    form: FilingForm,
    client: Client,
    api_key: String,
    user_agent: String,
    query_url: String,
    rate_limiter: SharedRateLimiter,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl SecFilingSearch {
    /// Create a filing search tool
    ///
    /// # Arguments
    /// * `form` - Which report to search
    /// * `api_key` - sec-api.io API key
    /// * `user_agent` - Name and contact email sent to sec.gov
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        form: FilingForm,
        api_key: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let quota = Quota::per_second(SEC_REQUESTS_PER_SECOND);

        Ok(Self {
            form,
            client,
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            query_url: SEC_QUERY_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Use a different query endpoint (proxies, tests)
    pub fn with_query_url(mut self, query_url: impl Into<String>) -> Self {
        self.query_url = query_url.into();
        self
    }

    pub fn form(&self) -> FilingForm {
        self.form
    }

    /// Cleaned text of the latest filing, fetched on first use
    pub async fn filing_text(&self, ticker: &str) -> Result<String> {
        if let Some(text) = self.cache.read().await.get(ticker) {
            debug!(ticker, form = %self.form, "Filing cache hit");
            return Ok(text.clone());
        }

        let url = self.latest_filing_url(ticker).await?;
        info!(ticker, form = %self.form, url = %url, "Downloading filing");
        let html = self.download(&url).await?;
        let text = clean_text(&html_to_text(&html));

        if text.is_empty() {
            return Err(ToolError::NotFound(format!(
                "{ticker}'s latest {} has no readable text",
                self.form
            )));
        }

        self.cache
            .write()
            .await
            .insert(ticker.to_string(), text.clone());
        Ok(text)
    }

    /// Link to the most recent filing of this form for the ticker
    #[instrument(skip(self))]
    pub async fn latest_filing_url(&self, ticker: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(&self.query_url)
            .query(&[("token", self.api_key.as_str())])
            .json(&filing_query(ticker, self.form))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Api(format!("SEC query returned {status}: {body}")));
        }

        let body: QueryResponse = response.json().await?;
        body.filings
            .into_iter()
            .next()
            .map(|filing| filing.link_to_filing_details)
            .ok_or_else(|| {
                ToolError::NotFound(format!("no {} filings found for ticker {ticker}", self.form))
            })
    }

    async fn download(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ToolError::Api(format!(
                "SEC download returned {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Tool for SecFilingSearch {
    fn capability(&self) -> Capability {
        Capability::SecFilings
    }

    fn name(&self) -> &str {
        self.form.tool_name()
    }

    fn description(&self) -> &str {
        self.form.description()
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let (ticker, query) = parse_input(input)?;
        let text = self.filing_text(&ticker).await?;
        let passages = top_passages(&text, query, TOP_PASSAGES);

        if passages.is_empty() {
            return Ok(format!(
                "No passages in {ticker}'s latest {} matched \"{query}\".",
                self.form
            ));
        }

        Ok(format!(
            "From {ticker}'s latest {} filing:\n\n{}",
            self.form,
            passages.join("\n\n...\n\n")
        ))
    }
}

/// Split `TICKER: query` into an uppercase ticker and the query
fn parse_input(input: &str) -> Result<(String, &str)> {
    let Some((ticker, query)) = input.split_once(':') else {
        return Err(ToolError::InvalidInput(
            "expected \"TICKER: query\", e.g. \"AAPL: risk factors\"".to_string(),
        ));
    };

    let ticker = ticker.trim().to_uppercase();
    let query = query.trim();

    if ticker.is_empty() || !ticker.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ToolError::InvalidInput(format!("invalid ticker '{ticker}'")));
    }
    if query.is_empty() {
        return Err(ToolError::InvalidInput("search query is empty".to_string()));
    }

    Ok((ticker, query))
}

fn filing_query(ticker: &str, form: FilingForm) -> serde_json::Value {
    json!({
        "query": {
            "query_string": {
                "query": format!("ticker:{ticker} AND formType:\"{}\"", form.as_str())
            }
        },
        "from": "0",
        "size": "1",
        "sort": [{ "filedAt": { "order": "desc" } }]
    })
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    filings: Vec<FilingHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilingHit {
    link_to_filing_details: String,
}

/// Visible text of an HTML document, skipping scripts and styles
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut pieces = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "head"))
        });
        if hidden {
            continue;
        }
        let content: &str = text;
        if !content.trim().is_empty() {
            pieces.push(content.trim().to_string());
        }
    }

    pieces.join(" ")
}

/// Replace unusual characters with spaces and collapse whitespace
pub fn clean_text(text: &str) -> String {
    let replaced = DISALLOWED_CHARS.replace_all(text, " ");
    WHITESPACE.replace_all(&replaced, " ").trim().to_string()
}

fn keywords(query: &str) -> HashSet<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Passages with the most keyword hits, in document order
pub fn top_passages(text: &str, query: &str, limit: usize) -> Vec<String> {
    let keywords = keywords(query);
    if keywords.is_empty() || limit == 0 {
        return Vec::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut scored: Vec<(usize, usize)> = words
        .chunks(PASSAGE_WORDS)
        .enumerate()
        .filter_map(|(index, chunk)| {
            let score = chunk
                .iter()
                .filter(|word| {
                    let word = word
                        .trim_matches(|c: char| !c.is_alphanumeric())
                        .to_lowercase();
                    keywords.contains(&word)
                })
                .count();
            (score > 0).then_some((index, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored.sort_by_key(|(index, _)| *index);

    scored
        .into_iter()
        .map(|(index, _)| {
            let start = index * PASSAGE_WORDS;
            let end = (start + PASSAGE_WORDS).min(words.len());
            words[start..end].join(" ")
        })
        .collect()
}
