//! Ticker validation and the investor profile

use crate::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Longest ticker symbol accepted
pub const MAX_TICKER_LEN: usize = 5;

/// Outcome of [`validate_tickers`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerValidation {
    /// Normalized symbols, in input order
    pub valid: Vec<String>,
    /// Inputs that were skipped, as given
    pub rejected: Vec<String>,
}

impl TickerValidation {
    /// The valid symbols, or an error if there are none
    pub fn require_any(self) -> Result<Vec<String>> {
        if self.valid.is_empty() {
            Err(WorkflowError::NoTickers)
        } else {
            Ok(self.valid)
        }
    }
}

/// Normalize ticker symbols and drop the ones that cannot be real
///
/// Each input is trimmed and upper-cased; it is kept when it is 1 to 5
/// ASCII letters or digits.
pub fn validate_tickers<S: AsRef<str>>(inputs: &[S]) -> TickerValidation {
    let mut result = TickerValidation::default();

    for input in inputs {
        let raw = input.as_ref();
        let ticker = raw.trim().to_uppercase();
        let ok = (1..=MAX_TICKER_LEN).contains(&ticker.len())
            && ticker.chars().all(|c| c.is_ascii_alphanumeric());

        if ok {
            result.valid.push(ticker);
        } else {
            warn!(ticker = raw, "Skipping invalid ticker symbol");
            result.rejected.push(raw.to_string());
        }
    }

    result
}

/// How much volatility the investor accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
    High,
}

impl RiskTolerance {
    pub const ALL: [RiskTolerance; 4] = [
        RiskTolerance::Conservative,
        RiskTolerance::Moderate,
        RiskTolerance::Aggressive,
        RiskTolerance::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
            RiskTolerance::High => "high",
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTolerance {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| {
                WorkflowError::InvalidProfile(format!(
                    "risk tolerance '{s}' is not one of conservative, moderate, aggressive, high"
                ))
            })
    }
}

/// How long the investor plans to hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentHorizon {
    #[serde(rename = "short-term")]
    ShortTerm,
    #[serde(rename = "medium-term")]
    MediumTerm,
    #[default]
    #[serde(rename = "long-term")]
    LongTerm,
    #[serde(rename = "5+ years")]
    FivePlusYears,
}

impl InvestmentHorizon {
    pub const ALL: [InvestmentHorizon; 4] = [
        InvestmentHorizon::ShortTerm,
        InvestmentHorizon::MediumTerm,
        InvestmentHorizon::LongTerm,
        InvestmentHorizon::FivePlusYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentHorizon::ShortTerm => "short-term",
            InvestmentHorizon::MediumTerm => "medium-term",
            InvestmentHorizon::LongTerm => "long-term",
            InvestmentHorizon::FivePlusYears => "5+ years",
        }
    }
}

impl fmt::Display for InvestmentHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentHorizon {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == wanted)
            .ok_or_else(|| {
                WorkflowError::InvalidProfile(format!(
                    "investment horizon '{s}' is not one of short-term, medium-term, long-term, 5+ years"
                ))
            })
    }
}

/// Who the recommendation is for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub goals: String,
    pub risk_tolerance: RiskTolerance,
    pub investment_horizon: InvestmentHorizon,
    pub investment_amount: String,
}

impl Default for InvestorProfile {
    fn default() -> Self {
        Self {
            goals: "long-term growth".to_string(),
            risk_tolerance: RiskTolerance::default(),
            investment_horizon: InvestmentHorizon::default(),
            investment_amount: "$10,000".to_string(),
        }
    }
}

impl InvestorProfile {
    pub fn new(
        goals: impl Into<String>,
        risk_tolerance: RiskTolerance,
        investment_horizon: InvestmentHorizon,
        investment_amount: impl Into<String>,
    ) -> Self {
        Self {
            goals: goals.into(),
            risk_tolerance,
            investment_horizon,
            investment_amount: investment_amount.into(),
        }
    }

    /// Bullet list used in prompts and report headers
    pub fn summary(&self) -> String {
        format!(
            "- Investment Goals: {}\n- Risk Tolerance: {}\n- Investment Horizon: {}\n- Investment Amount: {}",
            self.goals, self.risk_tolerance, self.investment_horizon, self.investment_amount
        )
    }
}
