//! Sequential workflow execution and the final report

use crate::research::{ResearchNote, gather_research};
use crate::tasks::{MAX_TASKS, TaskKind, TaskSpec, workflow_for};
use crate::{AgentRole, InvestorProfile, Result, WorkflowError};
use chrono::{DateTime, Utc};
use finsight_llm::{CompletionRequest, LLMProvider, Message, StopReason, TokenUsage};
use finsight_runtime::{AnalysisKind, CancellationToken};
use finsight_tools::ToolSet;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings for model calls made by the workflow
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Model to use
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: f32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// What to analyze and for whom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub tickers: Vec<String>,
    pub profile: InvestorProfile,
}

/// Output of one completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub kind: TaskKind,
    pub role: AgentRole,
    pub title: String,
    pub text: String,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub kind: AnalysisKind,
    pub tickers: Vec<String>,
    pub profile: InvestorProfile,
    pub research: Vec<ResearchNote>,
    pub outputs: Vec<TaskOutput>,
    pub usage: TokenUsage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WorkflowReport {
    /// Output of the last task, which is always the recommendation
    pub fn final_text(&self) -> &str {
        self.outputs.last().map_or("", |o| o.text.as_str())
    }

    /// Plain-text report with every task's output
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{} ANALYSIS: {}",
            self.kind.as_str().to_uppercase(),
            self.tickers.join(", ")
        );
        let _ = writeln!(out, "Generated: {}", self.finished_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "\nInvestor Profile:\n{}", self.profile.summary());

        for (i, output) in self.outputs.iter().enumerate() {
            let _ = writeln!(out, "\n{rule}");
            let _ = writeln!(out, "{}. {} ({})", i + 1, output.title, output.role);
            let _ = writeln!(out, "{rule}\n");
            let _ = writeln!(out, "{}", output.text.trim_end());
        }

        out
    }
}

/// Runs analyst tasks in order against a model
///
/// Cheap to clone; the provider and tools are shared.
#[derive(Clone)]
pub struct Workflow {
    provider: Arc<dyn LLMProvider>,
    tools: ToolSet,
    config: WorkflowConfig,
}

impl Workflow {
    /// Create a new workflow builder
    pub fn builder(provider: Arc<dyn LLMProvider>) -> WorkflowBuilder {
        WorkflowBuilder::new(provider)
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Execute the workflow
    ///
    /// Gathers research, then runs each task with the outputs of the tasks
    /// before it. The token is checked before every task and raced against
    /// every model call; once it fires the run stops with
    /// [`WorkflowError::Cancelled`].
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<WorkflowReport> {
        if request.tickers.is_empty() {
            return Err(WorkflowError::NoTickers);
        }

        let tasks = workflow_for(request.kind, &request.tickers, &request.profile);
        if tasks.len() > MAX_TASKS {
            return Err(WorkflowError::TooManyTasks(tasks.len()));
        }
        let total = tasks.len();

        let started_at = Utc::now();
        info!(
            kind = %request.kind,
            tickers = %request.tickers.join(","),
            tasks = total,
            "Starting analysis workflow"
        );

        let research = tokio::select! {
            () = cancel.cancelled() => {
                return Err(WorkflowError::Cancelled { completed: 0, total });
            }
            notes = gather_research(&self.tools, &request.tickers, request.kind) => notes,
        };
        debug!(notes = research.len(), "Research ready");

        let limiter = rate_limiter(request.kind);
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);
        let mut usage = TokenUsage::default();

        for (index, task) in tasks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(WorkflowError::Cancelled {
                    completed: outputs.len(),
                    total,
                });
            }

            info!("Task {}/{}: {}", index + 1, total, task.title);
            let completion_request = self.build_request(&task, &research, &outputs);

            let response = tokio::select! {
                () = cancel.cancelled() => {
                    return Err(WorkflowError::Cancelled { completed: outputs.len(), total });
                }
                response = async {
                    limiter.until_ready().await;
                    self.provider.complete(completion_request).await
                } => response.map_err(|source| WorkflowError::Task {
                    task: task.title.clone(),
                    source,
                })?,
            };

            if response.stop_reason.is_truncated() {
                warn!(task = %task.title, reason = ?response.stop_reason, "Task output cut short");
            }
            debug!(task = %task.title, tokens = response.usage.total(), "Task complete");

            usage += response.usage;
            outputs.push(TaskOutput {
                kind: task.kind,
                role: task.role,
                title: task.title,
                text: response.text,
            });
        }

        info!(tokens = usage.total(), "Analysis workflow finished");

        Ok(WorkflowReport {
            kind: request.kind,
            tickers: request.tickers.clone(),
            profile: request.profile.clone(),
            research,
            outputs,
            usage,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn build_request(
        &self,
        task: &TaskSpec,
        research: &[ResearchNote],
        previous: &[TaskOutput],
    ) -> CompletionRequest {
        CompletionRequest::builder(&self.config.model)
            .system(task.role.system_prompt())
            .add_message(Message::user(render_prompt(task, research, previous)))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build()
    }
}

/// Model calls allowed per minute for each kind of run
fn requests_per_minute(kind: AnalysisKind) -> NonZeroU32 {
    match kind {
        AnalysisKind::Quick => NonZeroU32::new(10),
        AnalysisKind::Comprehensive => NonZeroU32::new(5),
    }
    .unwrap_or(NonZeroU32::MIN)
}

fn rate_limiter(kind: AnalysisKind) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_minute(requests_per_minute(kind)))
}

fn render_prompt(task: &TaskSpec, research: &[ResearchNote], previous: &[TaskOutput]) -> String {
    let mut prompt = format!(
        "# {}\n\n{}\n\n## Expected output\n{}\n",
        task.title, task.description, task.expected_output
    );

    if !research.is_empty() {
        prompt.push_str("\n## Research notes\n");
        for note in research {
            let _ = write!(prompt, "\n### {} ({})\n{}\n", note.source, note.ticker, note.text);
        }
    }

    if !previous.is_empty() {
        prompt.push_str("\n## Findings from earlier steps\n");
        for output in previous {
            let _ = write!(prompt, "\n### {} ({})\n{}\n", output.title, output.role, output.text);
        }
    }

    prompt
}

/// Builder for constructing workflows
pub struct WorkflowBuilder {
    provider: Arc<dyn LLMProvider>,
    tools: ToolSet,
    config: WorkflowConfig,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            tools: ToolSet::offline(),
            config: WorkflowConfig::default(),
        }
    }

    /// Set the tools used for research gathering
    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Build the workflow
    pub fn build(self) -> Result<Workflow> {
        if self.config.model.trim().is_empty() {
            return Err(WorkflowError::Configuration(
                "model name must not be empty".to_string(),
            ));
        }
        if self.config.max_tokens == 0 {
            return Err(WorkflowError::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(Workflow {
            provider: self.provider,
            tools: self.tools,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use finsight_llm::{CompletionResponse, LLMError};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every request and answers with the task heading
    #[derive(Default)]
    struct ScriptedProvider {
        requests: Mutex<Vec<CompletionRequest>>,
        fail_on_call: Option<usize>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> finsight_llm::Result<CompletionResponse> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len()
            };

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on_call == Some(call) {
                return Err(LLMError::RateLimitExceeded("quota".to_string()));
            }

            let heading = request.messages[0]
                .text
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            Ok(CompletionResponse {
                text: format!("answer to {heading}"),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn request(kind: AnalysisKind) -> AnalysisRequest {
        AnalysisRequest {
            kind,
            tickers: vec!["AAPL".to_string(), "MSFT".to_string()],
            profile: InvestorProfile::default(),
        }
    }

    fn workflow(provider: &Arc<ScriptedProvider>) -> Workflow {
        Workflow::builder(provider.clone())
            .model("test-model")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_quick_run() {
        let provider = Arc::new(ScriptedProvider::default());
        let report = workflow(&provider)
            .run(&request(AnalysisKind::Quick), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.final_text(), "answer to # Investment Recommendation");
        assert_eq!(report.usage.total(), 30);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].model, "test-model");
        assert!(
            requests[0]
                .system
                .as_deref()
                .unwrap()
                .contains("Senior Stock Research Analyst")
        );
        // The second task sees the first task's output.
        assert!(requests[1].messages[0].text.contains("answer to # Rapid Stock Analysis"));
    }

    #[tokio::test]
    async fn test_comprehensive_runs_in_order() {
        let provider = Arc::new(ScriptedProvider::default());
        let report = workflow(&provider)
            .run(&request(AnalysisKind::Comprehensive), &CancellationToken::new())
            .await
            .unwrap();

        let kinds: Vec<_> = report.outputs.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::Research,
                TaskKind::FinancialAnalysis,
                TaskKind::MarketAnalysis,
                TaskKind::Recommendation,
            ]
        );

        let requests = provider.requests.lock().unwrap();
        let last = &requests[3].messages[0].text;
        assert!(last.contains("answer to # Stock Research"));
        assert!(last.contains("answer to # Market and Sector Analysis"));
    }

    #[tokio::test]
    async fn test_task_failure_names_task() {
        let provider = Arc::new(ScriptedProvider {
            fail_on_call: Some(2),
            ..ScriptedProvider::default()
        });
        let err = workflow(&provider)
            .run(&request(AnalysisKind::Quick), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            WorkflowError::Task { task, source: LLMError::RateLimitExceeded(_) }
                if task == "Investment Recommendation"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let provider = Arc::new(ScriptedProvider::default());
        let token = CancellationToken::new();
        token.cancel();

        let err = workflow(&provider)
            .run(&request(AnalysisKind::Quick), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Cancelled { completed: 0, total: 2 }));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_model_call() {
        let provider = Arc::new(ScriptedProvider {
            delay: Some(Duration::from_secs(30)),
            ..ScriptedProvider::default()
        });
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = workflow(&provider)
            .run(&request(AnalysisKind::Comprehensive), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Cancelled { completed: 0, total: 4 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_no_tickers() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut empty = request(AnalysisKind::Quick);
        empty.tickers.clear();

        let err = workflow(&provider)
            .run(&empty, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoTickers));
    }

    #[test]
    fn test_builder_validation() {
        let provider: Arc<dyn LLMProvider> = Arc::new(ScriptedProvider::default());
        assert!(Workflow::builder(provider.clone()).model(" ").build().is_err());
        assert!(Workflow::builder(provider).max_tokens(0).build().is_err());
    }

    #[test]
    fn test_render_prompt_sections() {
        let task = crate::tasks::quick_workflow(&["AAPL".to_string()], &InvestorProfile::default())
            .remove(1);
        let research = vec![ResearchNote {
            ticker: "AAPL".to_string(),
            source: "Search the internet".to_string(),
            text: "Apple beat estimates".to_string(),
        }];
        let previous = vec![TaskOutput {
            kind: TaskKind::QuickResearch,
            role: AgentRole::ResearchAnalyst,
            title: "Rapid Stock Analysis".to_string(),
            text: "Strong quarter".to_string(),
        }];

        let prompt = render_prompt(&task, &research, &previous);
        assert!(prompt.starts_with("# Investment Recommendation"));
        assert!(prompt.contains("## Expected output"));
        assert!(prompt.contains("### Search the internet (AAPL)\nApple beat estimates"));
        assert!(prompt.contains(
            "### Rapid Stock Analysis (Senior Stock Research Analyst)\nStrong quarter"
        ));
    }

    #[test]
    fn test_rate_limits() {
        assert_eq!(requests_per_minute(AnalysisKind::Quick).get(), 10);
        assert_eq!(requests_per_minute(AnalysisKind::Comprehensive).get(), 5);
    }

    #[test]
    fn test_render_report() {
        let report = WorkflowReport {
            kind: AnalysisKind::Quick,
            tickers: vec!["NVDA".to_string()],
            profile: InvestorProfile::default(),
            research: Vec::new(),
            outputs: vec![TaskOutput {
                kind: TaskKind::Recommendation,
                role: AgentRole::InvestmentAdvisor,
                title: "Investment Recommendation".to_string(),
                text: "Buy on dips.\n".to_string(),
            }],
            usage: TokenUsage::default(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let text = report.render();
        assert!(text.contains("QUICK ANALYSIS: NVDA"));
        assert!(text.contains("1. Investment Recommendation (Senior Investment Advisor)"));
        assert!(text.ends_with("Buy on dips.\n"));
        assert_eq!(report.final_text(), "Buy on dips.\n");
    }
}
