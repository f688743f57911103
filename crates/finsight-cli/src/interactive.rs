//! Step-by-step interactive mode

use anyhow::Result;
use finsight_runtime::{AnalysisKind, DeadlinePolicy};
use finsight_utils::AppConfig;
use finsight_workflow::{
    AnalysisRequest, InvestmentHorizon, InvestorProfile, RiskTolerance, validate_tickers,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::Duration;

use crate::analyze::{execute, gemini, print_report};
use crate::output::{resolve_interactive_path, save_report};

/// Line-oriented question and answer over any reader and writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask once; `None` at end of input
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until the answer parses, using `default` for an empty answer
    pub fn ask_parsed<T: FromStr>(
        &mut self,
        question: &str,
        default: &str,
        retry: &str,
    ) -> io::Result<T> {
        loop {
            let answer = self.ask(question)?.ok_or_else(end_of_input)?;
            let answer = if answer.is_empty() { default } else { &answer };
            if let Ok(value) = answer.parse() {
                return Ok(value);
            }
            writeln!(self.output, "{retry}")?;
        }
    }

    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

fn end_of_input() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "input closed")
}

/// Everything interactive mode collects before running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub request: AnalysisRequest,
    pub policy: DeadlinePolicy,
}

/// Ask for tickers, profile, analysis type and timeout
pub fn collect_session<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> io::Result<Session> {
    let tickers = loop {
        let answer = prompter
            .ask("📈 Enter stock symbols (comma-separated): ")?
            .ok_or_else(end_of_input)?;
        let inputs: Vec<&str> = answer.split(',').collect();
        let validation = validate_tickers(&inputs);
        for rejected in &validation.rejected {
            if !rejected.trim().is_empty() {
                prompter.say(&format!("⚠️  Skipping invalid ticker symbol: {rejected}"))?;
            }
        }
        if !validation.valid.is_empty() {
            break validation.valid;
        }
        prompter.say("Please enter valid stock ticker symbols (e.g., AAPL, MSFT, GOOGL)")?;
    };
    prompter.say(&format!("Selected stocks: {}", tickers.join(", ")))?;

    prompter.say("\n👤 Investor Profile Setup:")?;
    let goals = prompter
        .ask("Investment goals [long-term growth]: ")?
        .ok_or_else(end_of_input)?;
    let goals = if goals.is_empty() {
        InvestorProfile::default().goals
    } else {
        goals
    };

    let risk: RiskTolerance = prompter.ask_parsed(
        "Risk tolerance [conservative, moderate, aggressive, high] [moderate]: ",
        "moderate",
        "Please choose from: conservative, moderate, aggressive, high",
    )?;
    let horizon: InvestmentHorizon = prompter.ask_parsed(
        "Investment horizon [short-term, medium-term, long-term, 5+ years] [long-term]: ",
        "long-term",
        "Please choose from: short-term, medium-term, long-term, 5+ years",
    )?;
    let amount = prompter
        .ask("Investment amount [$10,000]: ")?
        .ok_or_else(end_of_input)?;
    let amount = if amount.is_empty() {
        InvestorProfile::default().investment_amount
    } else {
        amount
    };

    prompter.say("\n📊 Analysis Options:")?;
    prompter.say("1. Quick Analysis (faster, more reliable)")?;
    prompter.say("2. Comprehensive Analysis (detailed, may take longer)")?;
    let kind = loop {
        let choice = prompter
            .ask("Choose analysis type [1]: ")?
            .ok_or_else(end_of_input)?;
        match choice.as_str() {
            "" | "1" => break AnalysisKind::Quick,
            "2" => break AnalysisKind::Comprehensive,
            _ => prompter.say("Please enter 1 or 2")?,
        }
    };

    prompter.say("\n⏱️  Timeout:")?;
    prompter.say("1. Standard (5 minutes)")?;
    prompter.say("2. Extended (10 minutes)")?;
    prompter.say("3. No timeout (unlimited)")?;
    let policy = loop {
        let choice = prompter
            .ask("Choose timeout option [1]: ")?
            .ok_or_else(end_of_input)?;
        let policy = match choice.as_str() {
            "" | "1" => DeadlinePolicy::new(Duration::from_secs(300), false),
            "2" => DeadlinePolicy::new(Duration::from_secs(600), false),
            "3" => {
                prompter.say("⚠️  Running without timeout - analysis may take a very long time")?;
                Ok(DeadlinePolicy::unbounded())
            }
            _ => {
                prompter.say("Please enter 1, 2 or 3")?;
                continue;
            }
        };
        break policy.map_err(io::Error::other)?;
    };

    Ok(Session {
        request: AnalysisRequest {
            kind,
            tickers,
            profile: InvestorProfile::new(goals, risk, horizon, amount),
        },
        policy,
    })
}

/// Entry point for `finsight interactive` and for running with no arguments
pub async fn run() -> Result<()> {
    println!("🎯 Interactive Stock Analysis");
    println!("{}", "=".repeat(70));

    let config = AppConfig::from_env()?;
    for line in config.display_status() {
        println!("   {line}");
    }
    println!();

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let session = collect_session(&mut prompter)?;

    let report = execute(gemini(&config)?, &config, &session.request, session.policy).await?;
    print_report(&report);

    let answer = prompter.ask("\n💾 Save results to file? (y/N): ")?;
    if !matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes")) {
        return Ok(());
    }

    let default_name = crate::output::default_report_path(session.request.kind, chrono::Local::now());
    let question = format!("Filename [{}]: ", default_name.display());
    let filename = prompter.ask(&question)?.unwrap_or_default();
    let path = if filename.is_empty() {
        default_name
    } else {
        resolve_interactive_path(&filename)
    };

    match save_report(&report.render(), &path) {
        Ok(saved) => println!(
            "💾 Results saved to: {} ({} bytes)",
            saved.path.display(),
            saved.bytes
        ),
        Err(e) => eprintln!("❌ Could not save results: {e:#}"),
    }

    Ok(())
}
