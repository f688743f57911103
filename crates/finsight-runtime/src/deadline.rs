//! Deadline policy for the different classes of bounded operation
//!
//! The runner itself has no default deadline. This module is where callers
//! pick one: short for reachability probes, longer for analysis pipelines,
//! and none at all when the user opts out of enforcement.

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Deadline for API reachability and authentication probes
pub const PROBE_DEADLINE: Duration = Duration::from_secs(30);

/// Default base deadline for an analysis run
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(300);

/// Depth of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Two-step analysis; faster and more reliable
    Quick,
    /// Four-step analysis; slower and more detailed
    Comprehensive,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Quick => "quick",
            AnalysisKind::Comprehensive => "comprehensive",
        }
    }

    /// Every kind, shortest deadline first
    pub const ALL: [AnalysisKind; 2] = [AnalysisKind::Quick, AnalysisKind::Comprehensive];

    /// How many base timeouts this kind of run is allowed
    pub fn timeout_multiplier(&self) -> u32 {
        match self {
            AnalysisKind::Quick => 1,
            AnalysisKind::Comprehensive => 2,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "q" => Ok(AnalysisKind::Quick),
            "comprehensive" | "c" => Ok(AnalysisKind::Comprehensive),
            other => Err(RunnerError::Configuration(format!(
                "unknown analysis kind '{other}'"
            ))),
        }
    }
}

/// Chooses deadlines for probes and analysis runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    base_timeout: Duration,
    no_timeout: bool,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            base_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            no_timeout: false,
        }
    }
}

impl DeadlinePolicy {
    /// Create a policy with the given base timeout
    ///
    /// A zero base timeout is rejected unless enforcement is disabled, as is
    /// one too large to scale for every [`AnalysisKind`].
    pub fn new(base_timeout: Duration, no_timeout: bool) -> Result<Self> {
        if no_timeout {
            return Ok(Self {
                base_timeout,
                no_timeout,
            });
        }

        if base_timeout.is_zero() {
            return Err(RunnerError::Configuration(
                "analysis timeout must be greater than 0 seconds".to_string(),
            ));
        }

        let overflows = AnalysisKind::ALL
            .iter()
            .any(|kind| base_timeout.checked_mul(kind.timeout_multiplier()).is_none());
        if overflows {
            return Err(RunnerError::Configuration(format!(
                "analysis timeout of {}s is too large",
                base_timeout.as_secs()
            )));
        }

        Ok(Self {
            base_timeout,
            no_timeout,
        })
    }

    /// Policy that never enforces an analysis deadline
    pub fn unbounded() -> Self {
        Self {
            base_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            no_timeout: true,
        }
    }

    /// The base timeout before any multiplier
    pub fn base_timeout(&self) -> Duration {
        self.base_timeout
    }

    /// Whether analysis runs are left unbounded
    pub fn is_unbounded(&self) -> bool {
        self.no_timeout
    }

    /// Deadline for a reachability probe; always enforced
    pub fn probe(&self) -> Duration {
        PROBE_DEADLINE
    }

    /// Deadline for an analysis run, or `None` when the caller opted out
    pub fn for_analysis(&self, kind: AnalysisKind) -> Option<Duration> {
        if self.no_timeout {
            None
        } else {
            Some(self.base_timeout.saturating_mul(kind.timeout_multiplier()))
        }
    }
}
