//! Tool trait definition

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of capability an analysis can draw on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Arithmetic over financial figures
    Calculator,
    /// Summary of price, volume, market cap and P/E
    StockMetrics,
    /// Internet search
    WebSearch,
    /// Lookup inside SEC annual and quarterly filings
    SecFilings,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Calculator => "calculator",
            Capability::StockMetrics => "stock_metrics",
            Capability::WebSearch => "web_search",
            Capability::SecFilings => "sec_filings",
        }
    }

    /// Whether tools of this kind need network access
    pub fn needs_network(&self) -> bool {
        matches!(self, Capability::WebSearch | Capability::SecFilings)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for tools the analysis workflow can use
///
/// Tools take free-form text in and give free-form text back. The name is
/// stable and unique within a [`ToolSet`](crate::ToolSet); it is what users
/// type on the command line and what prompts refer to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which capability this tool provides
    fn capability(&self) -> Capability;

    /// Get the tool's name
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// Includes the expected input format.
    fn description(&self) -> &str;

    /// Run the tool on the given input
    async fn invoke(&self, input: &str) -> Result<String>;
}
