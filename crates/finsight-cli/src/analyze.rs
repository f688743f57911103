//! The analysis pipeline shared by `analyze` and interactive mode

use anyhow::{Result, anyhow, bail};
use clap::Args;
use finsight_llm::{GeminiProvider, LLMProvider, probe, troubleshooting_hints};
use finsight_runtime::{
    AnalysisKind, CancellationToken, DEFAULT_ANALYSIS_TIMEOUT, DeadlinePolicy, Failure, Outcome,
    run_async,
};
use finsight_tools::ToolSet;
use finsight_utils::AppConfig;
use finsight_workflow::{
    AnalysisRequest, InvestmentHorizon, InvestorProfile, RiskTolerance, Workflow, WorkflowError,
    WorkflowReport, validate_tickers,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::output::{default_report_path, save_report};

/// Arguments for `finsight analyze`
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Stock ticker symbols to analyze
    #[arg(short, long = "stocks", num_args = 1.., required = true)]
    pub stocks: Vec<String>,

    /// Quick analysis: research and a recommendation (default)
    #[arg(short, long, conflicts_with = "comprehensive")]
    pub quick: bool,

    /// Comprehensive analysis: research, financials, market and recommendation
    #[arg(short, long)]
    pub comprehensive: bool,

    /// Investment goals
    #[arg(short, long, default_value = "long-term growth")]
    pub goals: String,

    /// Risk tolerance: conservative, moderate, aggressive or high
    #[arg(short, long, default_value = "moderate")]
    pub risk: RiskTolerance,

    /// Investment horizon: short-term, medium-term, long-term or "5+ years"
    #[arg(short = 't', long = "horizon", default_value = "long-term")]
    pub horizon: InvestmentHorizon,

    /// Amount to invest
    #[arg(short, long, default_value = "$10,000")]
    pub amount: String,

    /// Base timeout in seconds; comprehensive runs get twice this
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Run without any deadline
    #[arg(long)]
    pub no_timeout: bool,

    /// Save the report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl AnalyzeArgs {
    pub fn kind(&self) -> AnalysisKind {
        if self.comprehensive {
            AnalysisKind::Comprehensive
        } else {
            AnalysisKind::Quick
        }
    }

    pub fn profile(&self) -> InvestorProfile {
        InvestorProfile::new(&self.goals, self.risk, self.horizon, &self.amount)
    }

    pub fn policy(&self) -> Result<DeadlinePolicy> {
        Ok(DeadlinePolicy::new(
            Duration::from_secs(self.timeout),
            self.no_timeout,
        )?)
    }
}

/// Entry point for `finsight analyze`
pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let policy = args.policy()?;

    let validation = validate_tickers(&args.stocks);
    for rejected in &validation.rejected {
        eprintln!("⚠️  Skipping invalid ticker symbol: {rejected}");
    }
    let tickers = validation.require_any()?;

    let request = AnalysisRequest {
        kind: args.kind(),
        tickers,
        profile: args.profile(),
    };

    let report = execute(gemini(&config)?, &config, &request, policy).await?;
    print_report(&report);

    let path = args
        .output
        .unwrap_or_else(|| default_report_path(request.kind, chrono::Local::now()));
    let saved = save_report(&report.render(), &path)?;
    println!("💾 Results saved to: {} ({} bytes)", saved.path.display(), saved.bytes);

    Ok(())
}

/// The Gemini provider described by `config`
pub fn gemini(config: &AppConfig) -> Result<Arc<dyn LLMProvider>> {
    Ok(Arc::new(GeminiProvider::from_config(config)?))
}

/// Probe the model, build the workflow and run it under the deadline policy
pub async fn execute(
    provider: Arc<dyn LLMProvider>,
    config: &AppConfig,
    request: &AnalysisRequest,
    policy: DeadlinePolicy,
) -> Result<WorkflowReport> {
    println!("📈 Analyzing stocks: {}", request.tickers.join(", "));
    println!("👤 Investor profile:\n{}", request.profile.summary());

    check_model(provider.clone(), &config.model, policy).await?;

    let tools = ToolSet::from_config(config)?;
    debug!(tools = ?tools.names(), "Tools configured");

    let workflow = Workflow::builder(provider)
        .model(&config.model)
        .tools(tools)
        .build()?;

    let deadline = policy.for_analysis(request.kind);
    match deadline {
        Some(d) => println!(
            "🚀 Starting {} analysis (timeout {}s)...",
            request.kind,
            d.as_secs()
        ),
        None => println!(
            "🚀 Starting {} analysis (no timeout; this may take a long time)...",
            request.kind
        ),
    }

    let outcome = match deadline {
        Some(deadline) => {
            let workflow = workflow.clone();
            let request = request.clone();
            run_async(
                move |token| async move { workflow.run(&request, &token).await },
                deadline,
                "analysis",
            )
            .await?
        }
        None => Outcome::from_result(workflow.run(request, &CancellationToken::new()).await),
    };

    match outcome {
        Outcome::Completed(report) => {
            info!(tokens = report.usage.total(), "Analysis completed");
            Ok(report)
        }
        Outcome::Failed(Failure::Error(error)) => {
            print_workflow_hints(&error);
            Err(anyhow!(error).context("Analysis failed"))
        }
        Outcome::Failed(Failure::Panicked(message)) => {
            bail!("Analysis crashed: {message}")
        }
        Outcome::TimedOut { deadline } => {
            eprintln!("\n⏰ Analysis did not finish within {deadline:?}.");
            eprintln!("   - Try quick analysis (-q), which makes fewer model calls");
            eprintln!("   - Raise the limit, e.g. --timeout 600");
            eprintln!("   - Or run with --no-timeout");
            bail!("Analysis timed out after {deadline:?}")
        }
    }
}

/// Make sure the model answers before starting a long run
async fn check_model(
    provider: Arc<dyn LLMProvider>,
    model: &str,
    policy: DeadlinePolicy,
) -> Result<()> {
    println!("🔌 Testing connection to {model}...");

    let model_name = model.to_string();
    let outcome = run_async(
        move |_token| async move { probe(provider.as_ref(), &model_name).await },
        policy.probe(),
        "model probe",
    )
    .await?;

    match outcome {
        Outcome::Completed(reply) => {
            println!("✅ Model connection OK: {reply}");
            Ok(())
        }
        Outcome::Failed(Failure::Error(error)) => {
            for hint in troubleshooting_hints(&error) {
                eprintln!("   - {hint}");
            }
            if error.is_credential_problem() {
                eprintln!("   - Run `finsight diagnose` to check every credential");
            }
            Err(anyhow!(error).context("Model connection test failed"))
        }
        Outcome::Failed(failure) => bail!("Model connection test failed: {failure}"),
        Outcome::TimedOut { deadline } => bail!(
            "Model connection test timed out after {}s; check your network and GOOGLE_API_KEY",
            deadline.as_secs()
        ),
    }
}

fn print_workflow_hints(error: &WorkflowError) {
    if let Some(llm_error) = error.llm_error() {
        for hint in troubleshooting_hints(llm_error) {
            eprintln!("   - {hint}");
        }
    }
}

pub fn print_report(report: &WorkflowReport) {
    let rule = "=".repeat(80);
    println!("\n{rule}");
    println!("📊 {} ANALYSIS RESULTS", report.kind.as_str().to_uppercase());
    println!("{rule}");
    println!("{}", report.final_text().trim_end());
    println!("{rule}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use finsight_llm::{
        CompletionRequest, CompletionResponse, LLMError, PROBE_PROMPT, Result as LlmResult,
        StopReason, TokenUsage,
    };

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AnalyzeArgs,
    }

    fn parse(argv: &[&str]) -> AnalyzeArgs {
        Harness::try_parse_from(std::iter::once("finsight").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["-s", "AAPL", "MSFT"]);
        assert_eq!(args.stocks, vec!["AAPL", "MSFT"]);
        assert_eq!(args.kind(), AnalysisKind::Quick);
        assert_eq!(args.profile(), InvestorProfile::default());

        let policy = args.policy().unwrap();
        assert_eq!(
            policy.for_analysis(AnalysisKind::Quick),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_comprehensive_with_profile() {
        let args = parse(&[
            "-s", "TSLA", "-c", "-g", "aggressive growth", "-r", "high", "-t", "5+ years", "-a",
            "$1,000", "--timeout", "120",
        ]);
        assert_eq!(args.kind(), AnalysisKind::Comprehensive);
        assert_eq!(args.risk, RiskTolerance::High);
        assert_eq!(args.horizon, InvestmentHorizon::FivePlusYears);
        assert_eq!(args.profile().investment_amount, "$1,000");
        assert_eq!(
            args.policy().unwrap().for_analysis(args.kind()),
            Some(Duration::from_secs(240))
        );
    }

    #[test]
    fn test_no_timeout() {
        let args = parse(&["-s", "NVDA", "--no-timeout"]);
        assert_eq!(args.policy().unwrap().for_analysis(args.kind()), None);
    }

    #[test]
    fn test_rejects_bad_input() {
        let harness = |argv: &[&str]| {
            Harness::try_parse_from(std::iter::once("finsight").chain(argv.iter().copied()))
        };
        assert!(harness(&["-s", "AAPL", "-q", "-c"]).is_err());
        assert!(harness(&["-s", "AAPL", "-r", "reckless"]).is_err());
        assert!(harness(&[]).is_err());
        assert!(parse(&["-s", "AAPL", "--timeout", "0"]).policy().is_err());
        assert!(
            parse(&["-s", "AAPL", "-c", "--timeout", "9223372036854775808"])
                .policy()
                .is_err()
        );
    }

    /// How the stub model answers analysis prompts
    #[derive(Clone, Copy)]
    enum Reply {
        Answer,
        Fail,
        Panic,
        Hang,
        RejectKey,
    }

    struct StubModel {
        reply: Reply,
    }

    #[async_trait::async_trait]
    impl LLMProvider for StubModel {
        async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
            let is_probe = request.user_text().any(|text| text == PROBE_PROMPT);
            match (self.reply, is_probe) {
                (Reply::RejectKey, _) => {
                    return Err(LLMError::AuthenticationFailed("API key not valid".into()));
                }
                (_, true) | (Reply::Answer, false) => {}
                (Reply::Fail, false) => {
                    return Err(LLMError::RateLimitExceeded("quota exhausted".into()));
                }
                (Reply::Panic, false) => panic!("model exploded"),
                (Reply::Hang, false) => tokio::time::sleep(Duration::from_secs(30)).await,
            }
            let text = if is_probe {
                "Connection test successful".to_string()
            } else {
                format!("Hold {}", request.model)
            };
            Ok(CompletionResponse {
                text,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            kind: AnalysisKind::Quick,
            tickers: vec!["AAPL".to_string()],
            profile: InvestorProfile::default(),
        }
    }

    async fn execute_with(reply: Reply, policy: DeadlinePolicy) -> Result<WorkflowReport> {
        let config = AppConfig::builder().google_api_key("test-key").build().unwrap();
        let provider: Arc<dyn LLMProvider> = Arc::new(StubModel { reply });
        execute(provider, &config, &request(), policy).await
    }

    #[tokio::test]
    async fn test_execute_completes() {
        let report = execute_with(Reply::Answer, DeadlinePolicy::default())
            .await
            .unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert!(report.final_text().starts_with("Hold "));
    }

    #[tokio::test]
    async fn test_execute_unbounded_completes() {
        let report = execute_with(Reply::Answer, DeadlinePolicy::unbounded())
            .await
            .unwrap();
        assert_eq!(report.outputs.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let policy = DeadlinePolicy::new(Duration::from_millis(50), false).unwrap();
        let err = execute_with(Reply::Hang, policy).await.unwrap_err();
        assert_eq!(err.to_string(), "Analysis timed out after 50ms");
    }

    #[tokio::test]
    async fn test_execute_reports_model_failure() {
        let err = execute_with(Reply::Fail, DeadlinePolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Analysis failed");
        assert!(format!("{err:#}").contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_execute_reports_panic() {
        let err = execute_with(Reply::Panic, DeadlinePolicy::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Analysis crashed"));
        assert!(err.to_string().contains("model exploded"));
    }

    #[tokio::test]
    async fn test_execute_stops_at_failed_probe() {
        let err = execute_with(Reply::RejectKey, DeadlinePolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model connection test failed");
    }
}
