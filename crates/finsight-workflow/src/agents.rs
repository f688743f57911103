//! Analyst roles that frame each task prompt

use serde::{Deserialize, Serialize};
use std::fmt;

/// The analyst persona a task is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ResearchAnalyst,
    FinancialAnalyst,
    MarketStrategist,
    InvestmentAdvisor,
}

impl AgentRole {
    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::ResearchAnalyst => "Senior Stock Research Analyst",
            AgentRole::FinancialAnalyst => "Expert Financial Analyst",
            AgentRole::MarketStrategist => "Chief Market Strategist",
            AgentRole::InvestmentAdvisor => "Senior Investment Advisor",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            AgentRole::ResearchAnalyst => {
                "Research stocks thoroughly, gathering the financial data, market trends \
                 and industry context an investment decision needs"
            }
            AgentRole::FinancialAnalyst => {
                "Assess financial health and valuation through ratios, earnings quality \
                 and capital structure"
            }
            AgentRole::MarketStrategist => {
                "Read macroeconomic conditions, sector dynamics and market cycles to judge \
                 timing and positioning"
            }
            AgentRole::InvestmentAdvisor => {
                "Turn the analysis into clear, personalized recommendations that fit the \
                 investor's goals and risk tolerance"
            }
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            AgentRole::ResearchAnalyst => {
                "You have spent fifteen years in equity research at large investment banks. \
                 You read financial statements and SEC filings closely, compare companies \
                 against their peers and support every finding with evidence."
            }
            AgentRole::FinancialAnalyst => {
                "You hold an MBA and the CFA charter and have twelve years of experience in \
                 financial modeling. You are quick to spot red flags in a balance sheet and \
                 to tell whether a company is fairly valued."
            }
            AgentRole::MarketStrategist => {
                "You have led market strategy at major investment firms and are often quoted \
                 in the financial press. You translate macro data into concrete investment \
                 themes."
            }
            AgentRole::InvestmentAdvisor => {
                "You have managed portfolios for individuals and institutions through several \
                 market cycles and hold both CFA and CFP certifications. Your advice is \
                 specific and actionable."
            }
        }
    }

    /// System prompt for model calls made in this role
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}.\n\nYour goal: {}.\n\n{}\n\n\
             Be specific, cite figures from the material you are given, and say so plainly \
             when information is missing. This is analysis, not personal financial advice.",
            self.title(),
            self.goal(),
            self.backstory()
        )
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_includes_role() {
        let prompt = AgentRole::InvestmentAdvisor.system_prompt();
        assert!(prompt.starts_with("You are the Senior Investment Advisor."));
        assert!(prompt.contains(AgentRole::InvestmentAdvisor.goal()));
    }

    #[test]
    fn test_titles_distinct() {
        let titles = [
            AgentRole::ResearchAnalyst,
            AgentRole::FinancialAnalyst,
            AgentRole::MarketStrategist,
            AgentRole::InvestmentAdvisor,
        ]
        .map(|r| r.title());
        for (i, a) in titles.iter().enumerate() {
            assert!(titles[i + 1..].iter().all(|b| a != b));
        }
    }
}
