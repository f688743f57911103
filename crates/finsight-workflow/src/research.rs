//! Tool lookups gathered before the first task
//!
//! The model never calls tools itself. Instead, a few lookups per ticker run
//! up front and their results ride along in every prompt.

use finsight_runtime::AnalysisKind;
use finsight_tools::{Capability, FilingForm, ToolSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Longest excerpt kept from one lookup
pub const MAX_NOTE_CHARS: usize = 4_000;

/// Output of one tool lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchNote {
    pub ticker: String,
    pub source: String,
    pub text: String,
}

/// Run the lookups the tool set allows
///
/// One web search per ticker when search is configured. Comprehensive runs
/// also pull a 10-K excerpt per ticker when filing search is configured.
/// Failed lookups are logged and left out.
pub async fn gather_research(
    tools: &ToolSet,
    tickers: &[String],
    kind: AnalysisKind,
) -> Vec<ResearchNote> {
    let mut lookups = Vec::new();

    if let Some(search) = tools.by_capability(Capability::WebSearch) {
        for ticker in tickers {
            lookups.push((
                ticker,
                search.name().to_string(),
                format!("{ticker} stock latest news earnings analyst outlook"),
            ));
        }
    }

    if kind == AnalysisKind::Comprehensive {
        let annual = FilingForm::Form10K.tool_name();
        if tools.get(annual).is_some() {
            for ticker in tickers {
                lookups.push((
                    ticker,
                    annual.to_string(),
                    format!("{ticker}: revenue growth risk factors competition outlook"),
                ));
            }
        }
    }

    let mut notes = Vec::with_capacity(lookups.len());
    for (ticker, tool, input) in lookups {
        match tools.invoke(&tool, &input).await {
            Ok(text) => {
                debug!(ticker = %ticker, tool = %tool, chars = text.len(), "Research gathered");
                notes.push(ResearchNote {
                    ticker: ticker.clone(),
                    source: tool,
                    text: truncate_chars(&text, MAX_NOTE_CHARS),
                });
            }
            Err(e) => warn!(ticker = %ticker, tool = %tool, error = %e, "Research lookup failed"),
        }
    }

    notes
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
