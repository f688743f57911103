//! Analysis workflow for finsight
//!
//! This crate turns a list of tickers and an investor profile into a short
//! sequence of analyst tasks and runs them, one after another, against a
//! language model:
//!
//! - [`profile`]: ticker validation and the investor profile
//! - [`agents`]: the analyst roles that frame each prompt
//! - [`tasks`]: task definitions for quick and comprehensive runs
//! - [`research`]: tool lookups gathered before the first task
//! - [`workflow`]: sequential execution and the final report

pub mod agents;
pub mod error;
pub mod profile;
pub mod research;
pub mod tasks;
pub mod workflow;

pub use agents::AgentRole;
pub use error::{Result, WorkflowError};
pub use profile::{
    InvestmentHorizon, InvestorProfile, RiskTolerance, TickerValidation, validate_tickers,
};
pub use research::{ResearchNote, gather_research};
pub use tasks::{MAX_TASKS, TaskKind, TaskSpec, workflow_for};
pub use workflow::{
    AnalysisRequest, TaskOutput, Workflow, WorkflowBuilder, WorkflowConfig, WorkflowReport,
};
