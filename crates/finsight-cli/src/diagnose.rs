//! `finsight diagnose`: connectivity and credential checks

use anyhow::{Result, bail};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use finsight_llm::{GeminiProvider, LLMError, probe, troubleshooting_hints};
use finsight_runtime::{Failure, Outcome, PROBE_DEADLINE, run_async};
use finsight_tools::{FilingForm, SecFilingSearch, ToolSet, WebSearch};
use finsight_utils::AppConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const CONNECTIVITY_URL: &str = "https://www.google.com";

/// How a single check ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed(String),
    Failed(String),
    TimedOut(Duration),
    Skipped(String),
}

impl CheckStatus {
    fn label(&self) -> (&'static str, Color) {
        match self {
            CheckStatus::Passed(_) => ("PASS", Color::Green),
            CheckStatus::Failed(_) => ("FAIL", Color::Red),
            CheckStatus::TimedOut(_) => ("TIMEOUT", Color::Red),
            CheckStatus::Skipped(_) => ("SKIP", Color::Yellow),
        }
    }

    fn detail(&self) -> String {
        match self {
            CheckStatus::Passed(d) | CheckStatus::Failed(d) | CheckStatus::Skipped(d) => d.clone(),
            CheckStatus::TimedOut(deadline) => format!("no answer within {}s", deadline.as_secs()),
        }
    }

    fn is_problem(&self) -> bool {
        matches!(self, CheckStatus::Failed(_) | CheckStatus::TimedOut(_))
    }
}

/// One row of the diagnosis
#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub critical: bool,
    pub status: CheckStatus,
    pub hints: Vec<String>,
}

impl Check {
    fn blocks_analysis(&self) -> bool {
        self.critical && self.status.is_problem()
    }
}

/// Run `operation` under the probe deadline and summarize it
async fn bounded<T, E, F, Fut>(label: &'static str, operation: F) -> (CheckStatus, Option<E>)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Display + Send + 'static,
    E: Display + Send + 'static,
{
    let future = operation();
    match run_async(move |_token| future, PROBE_DEADLINE, label).await {
        Ok(Outcome::Completed(value)) => (CheckStatus::Passed(value.to_string()), None),
        Ok(Outcome::Failed(Failure::Error(e))) => (CheckStatus::Failed(e.to_string()), Some(e)),
        Ok(Outcome::Failed(failure)) => (CheckStatus::Failed(failure.to_string()), None),
        Ok(Outcome::TimedOut { deadline }) => (CheckStatus::TimedOut(deadline), None),
        Err(e) => (CheckStatus::Failed(e.to_string()), None),
    }
}

async fn check_internet(timeout: Duration) -> Check {
    let (status, _) = bounded("internet", move || async move {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let response = client.get(CONNECTIVITY_URL).send().await?;
        Ok::<_, reqwest::Error>(format!("HTTP {}", response.status()))
    })
    .await;

    let hints = if status.is_problem() {
        vec!["Check your internet connection, proxy and firewall settings.".to_string()]
    } else {
        Vec::new()
    };
    Check {
        name: "Internet",
        critical: true,
        status,
        hints,
    }
}

async fn check_gemini(config: &AppConfig) -> Check {
    let provider = match GeminiProvider::from_config(config) {
        Ok(provider) => provider,
        Err(e) => {
            return Check {
                name: "Gemini API",
                critical: true,
                hints: hints_for(&e),
                status: CheckStatus::Failed(e.to_string()),
            };
        }
    };

    let model = config.model.clone();
    let (status, error) = bounded("gemini probe", move || async move {
        probe(&provider, &model).await
    })
    .await;

    let mut hints = error.as_ref().map(hints_for).unwrap_or_default();
    if let CheckStatus::TimedOut(_) = status {
        hints.push("The model did not answer in time. Check network latency and quota.".to_string());
    }
    Check {
        name: "Gemini API",
        critical: true,
        status,
        hints,
    }
}

async fn check_serper(config: &AppConfig) -> Check {
    let Some(key) = config.serper_api_key.clone() else {
        return skipped("Serper search", "SERPER_API_KEY not set; web search disabled");
    };

    let timeout = config.request_timeout;
    let (status, _) = bounded("serper probe", move || async move {
        let search = WebSearch::new(key, timeout)?;
        let results = search.search("stock market").await?;
        Ok::<_, finsight_tools::ToolError>(format!("{} results", results.len()))
    })
    .await;

    let hints = if status.is_problem() {
        vec!["Verify SERPER_API_KEY at https://serper.dev.".to_string()]
    } else {
        Vec::new()
    };
    Check {
        name: "Serper search",
        critical: false,
        status,
        hints,
    }
}

async fn check_sec(config: &AppConfig) -> Check {
    let Some(key) = config.sec_api_key.clone() else {
        return skipped("SEC API", "SEC_API_API_KEY not set; filing search disabled");
    };

    let user_agent = config.sec_user_agent.clone();
    let timeout = config.request_timeout;
    let (status, _) = bounded("sec probe", move || async move {
        let filings = SecFilingSearch::new(FilingForm::Form10K, key, user_agent, timeout)?;
        filings.latest_filing_url("AAPL").await
    })
    .await;

    let hints = if status.is_problem() {
        vec!["Verify SEC_API_API_KEY at https://sec-api.io.".to_string()]
    } else {
        Vec::new()
    };
    Check {
        name: "SEC API",
        critical: false,
        status,
        hints,
    }
}

async fn check_tools() -> Check {
    let report = ToolSet::offline().self_test().await;
    let failures: Vec<String> = report
        .checks
        .iter()
        .filter_map(|(name, verdict)| verdict.as_ref().err().map(|e| format!("{name}: {e}")))
        .collect();

    let status = if report.passed() {
        CheckStatus::Passed(format!("{} tools OK", report.checks.len()))
    } else {
        CheckStatus::Failed(failures.join("; "))
    };
    Check {
        name: "Tool self-test",
        critical: true,
        status,
        hints: Vec::new(),
    }
}

fn skipped(name: &'static str, reason: &str) -> Check {
    Check {
        name,
        critical: false,
        status: CheckStatus::Skipped(reason.to_string()),
        hints: Vec::new(),
    }
}

fn hints_for(error: &LLMError) -> Vec<String> {
    troubleshooting_hints(error)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Render the checks as a table
pub fn summary_table(checks: &[Check]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Check", "Status", "Details"]);

    for check in checks {
        let (label, color) = check.status.label();
        let name = if check.critical {
            format!("{} *", check.name)
        } else {
            check.name.to_string()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(label).fg(color),
            Cell::new(check.status.detail()),
        ]);
    }

    table
}

/// Entry point for `finsight diagnose`
pub async fn run() -> Result<()> {
    println!("🔍 finsight diagnostics\n");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration: {e}");
            eprintln!("   - Create a .env file with GOOGLE_API_KEY=your_key");
            bail!("Configuration is incomplete");
        }
    };
    for line in config.display_status() {
        println!("   {line}");
    }
    println!();

    let checks = vec![
        check_internet(config.request_timeout).await,
        check_gemini(&config).await,
        check_serper(&config).await,
        check_sec(&config).await,
        check_tools().await,
    ];

    println!("{}", summary_table(&checks));
    println!("* critical for analysis");

    for check in checks.iter().filter(|c| !c.hints.is_empty()) {
        println!("\n💡 {}:", check.name);
        for hint in &check.hints {
            println!("   - {hint}");
        }
    }

    let blocking: Vec<&str> = checks
        .iter()
        .filter(|c| c.blocks_analysis())
        .map(|c| c.name)
        .collect();
    if !blocking.is_empty() {
        bail!("Critical checks failed: {}", blocking.join(", "));
    }

    println!("\n✅ All critical checks passed. Ready to analyze.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_completed() {
        let (status, error) =
            bounded("ok", || async { Ok::<_, String>("fine".to_string()) }).await;
        assert_eq!(status, CheckStatus::Passed("fine".to_string()));
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_bounded_failed_keeps_error() {
        let (status, error) =
            bounded("err", || async { Err::<String, _>("bad key".to_string()) }).await;
        assert_eq!(status, CheckStatus::Failed("bad key".to_string()));
        assert_eq!(error.as_deref(), Some("bad key"));
    }

    #[tokio::test]
    async fn test_tool_check_passes() {
        let check = check_tools().await;
        assert!(matches!(check.status, CheckStatus::Passed(_)));
        assert!(!check.blocks_analysis());
    }

    #[tokio::test]
    async fn test_optional_checks_skip_without_keys() {
        let config = AppConfig::builder().google_api_key("k").build().unwrap();
        let serper = check_serper(&config).await;
        let sec = check_sec(&config).await;
        assert!(matches!(serper.status, CheckStatus::Skipped(_)));
        assert!(matches!(sec.status, CheckStatus::Skipped(_)));
        assert!(!serper.blocks_analysis());
    }

    #[test]
    fn test_only_critical_failures_block() {
        let failed_optional = Check {
            name: "SEC API",
            critical: false,
            status: CheckStatus::Failed("401".to_string()),
            hints: Vec::new(),
        };
        let timed_out_critical = Check {
            name: "Gemini API",
            critical: true,
            status: CheckStatus::TimedOut(PROBE_DEADLINE),
            hints: Vec::new(),
        };
        assert!(!failed_optional.blocks_analysis());
        assert!(timed_out_critical.blocks_analysis());
        assert_eq!(timed_out_critical.status.detail(), "no answer within 30s");
    }

    #[test]
    fn test_summary_table() {
        let checks = vec![
            Check {
                name: "Internet",
                critical: true,
                status: CheckStatus::Passed("HTTP 200 OK".to_string()),
                hints: Vec::new(),
            },
            skipped("Serper search", "SERPER_API_KEY not set"),
        ];
        let rendered = summary_table(&checks).to_string();
        assert!(rendered.contains("Internet *"));
        assert!(rendered.contains("PASS"));
        assert!(rendered.contains("SKIP"));
    }
}
