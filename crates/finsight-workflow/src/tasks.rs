//! Task definitions for quick and comprehensive analysis

use crate::{AgentRole, InvestorProfile};
use finsight_runtime::AnalysisKind;
use serde::{Deserialize, Serialize};

/// Most tasks a single run may contain
pub const MAX_TASKS: usize = 4;

/// What a task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    QuickResearch,
    Research,
    FinancialAnalysis,
    MarketAnalysis,
    Recommendation,
}

/// One step of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub role: AgentRole,
    pub title: String,
    pub description: String,
    pub expected_output: String,
}

/// Tasks for the given kind of analysis, in execution order
pub fn workflow_for(
    kind: AnalysisKind,
    tickers: &[String],
    profile: &InvestorProfile,
) -> Vec<TaskSpec> {
    match kind {
        AnalysisKind::Quick => quick_workflow(tickers, profile),
        AnalysisKind::Comprehensive => comprehensive_workflow(tickers, profile),
    }
}

/// Combined research followed by a recommendation
pub fn quick_workflow(tickers: &[String], profile: &InvestorProfile) -> Vec<TaskSpec> {
    let stocks = tickers.join(", ");
    vec![
        quick_research(&stocks, profile),
        recommendation(&stocks, profile),
    ]
}

/// Research, financial analysis, market analysis, recommendation
pub fn comprehensive_workflow(tickers: &[String], profile: &InvestorProfile) -> Vec<TaskSpec> {
    let stocks = tickers.join(", ");
    vec![
        research(&stocks),
        financial_analysis(&stocks),
        market_analysis(&stocks),
        recommendation(&stocks, profile),
    ]
}

fn quick_research(stocks: &str, profile: &InvestorProfile) -> TaskSpec {
    TaskSpec {
        kind: TaskKind::QuickResearch,
        role: AgentRole::ResearchAnalyst,
        title: "Rapid Stock Analysis".to_string(),
        description: format!(
            "Give a focused analysis of the target stocks for a quick investment decision.\n\n\
             Cover:\n\
             1. Key financial metrics and recent performance\n\
             2. Current valuation against history and peers\n\
             3. Major recent developments and their impact\n\
             4. The main investment thesis and key risks\n\
             5. Fit with the investor profile\n\n\
             Target Stocks: {stocks}\n\
             Investor Profile:\n{}",
            profile.summary()
        ),
        expected_output: "A concise report with key financial highlights and valuation \
                          metrics, the thesis and main risks for each stock, a quick \
                          assessment of fit with the investor profile and a clear \
                          recommendation with rationale."
            .to_string(),
    }
}

fn research(stocks: &str) -> TaskSpec {
    TaskSpec {
        kind: TaskKind::Research,
        role: AgentRole::ResearchAnalyst,
        title: "Stock Research".to_string(),
        description: format!(
            "Research the target stocks in depth.\n\n\
             Scope:\n\
             - Fundamentals: revenue, earnings, growth trends, margins\n\
             - Financial health: debt, cash flow, liquidity\n\
             - Industry position and competitive advantages\n\
             - Recent news, earnings reports and developments\n\
             - Management quality and strategic direction\n\
             - Key risks and challenges\n\n\
             Target Stocks: {stocks}\n\
             Focus Areas: fundamental analysis, industry trends, competitive positioning"
        ),
        expected_output: "A research report with an executive summary per stock, key \
                          metrics and trends, industry and competitive analysis, growth \
                          drivers and risk factors, and recent developments with their \
                          likely impact."
            .to_string(),
    }
}

fn financial_analysis(stocks: &str) -> TaskSpec {
    TaskSpec {
        kind: TaskKind::FinancialAnalysis,
        role: AgentRole::FinancialAnalyst,
        title: "Financial Analysis".to_string(),
        description: format!(
            "Analyze the financials of the target stocks.\n\n\
             1. Valuation: P/E, P/B, P/S, EV/EBITDA against peers and history\n\
             2. Financial health: margins, ROE, ROA, liquidity and leverage ratios, cash flow\n\
             3. Growth: revenue and earnings trends, margin direction, capital allocation\n\
             4. Quality: earnings consistency, balance sheet strength, cash conversion\n\n\
             Target Stocks: {stocks}\n\
             Analysis Focus: valuation, financial health, growth prospects"
        ),
        expected_output: "A financial analysis with a valuation assessment across several \
                          metrics, a health evaluation with key ratios, growth \
                          sustainability, red flags, peer comparison and a conclusion on \
                          fair value."
            .to_string(),
    }
}

fn market_analysis(stocks: &str) -> TaskSpec {
    TaskSpec {
        kind: TaskKind::MarketAnalysis,
        role: AgentRole::MarketStrategist,
        title: "Market and Sector Analysis".to_string(),
        description: format!(
            "Put the target stocks in their market context.\n\n\
             1. Market environment: trends, sentiment, rates, volatility\n\
             2. Sector: growth prospects, regulation, competitive shifts, disruption\n\
             3. Timing: cycle position, seasonal factors, upcoming catalysts\n\
             4. Risks: systemic, geopolitical and sector-specific\n\n\
             Target Stocks: {stocks}\n\
             Market Focus: current conditions, sector trends, timing considerations"
        ),
        expected_output: "A market analysis covering the current environment and outlook, \
                          sector dynamics, key drivers and catalysts, risk scenarios, \
                          timing and what it all means for the target stocks."
            .to_string(),
    }
}

fn recommendation(stocks: &str, profile: &InvestorProfile) -> TaskSpec {
    TaskSpec {
        kind: TaskKind::Recommendation,
        role: AgentRole::InvestmentAdvisor,
        title: "Investment Recommendation".to_string(),
        description: format!(
            "Using the findings so far, give personalized investment recommendations.\n\n\
             1. Portfolio fit: goals, risk tolerance, horizon, position sizing\n\
             2. Risk and return: upside and downside scenarios, volatility, mitigation\n\
             3. Strategy: top pick with rationale, entry timing, price targets, exit and stop-loss levels\n\
             4. Alternatives: other sectors or lower-risk options worth considering\n\n\
             Investor Profile:\n{}\n\
             - Target Stocks: {stocks}",
            profile.summary()
        ),
        expected_output: "A personalized recommendation with the top pick and its thesis, \
                          rationale drawn from the analysis, risk assessment against the \
                          profile, entry strategy and price targets, position sizing, \
                          catalysts, exit strategy and alternatives."
            .to_string(),
    }
}
