//! Analysis tools for finsight
//!
//! This crate provides the fixed set of capabilities the analysis workflow can
//! draw on: a safe arithmetic calculator, a stock metrics summarizer, web
//! search through Serper and keyword lookup inside SEC 10-K/10-Q filings.
//!
//! Every tool takes a plain string and returns a plain string, so the same
//! tools can be driven by the workflow or straight from the command line.

pub mod calculator;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod search;
pub mod sec_filing;
pub mod tool;

pub use calculator::Calculator;
pub use error::{Result, ToolError};
pub use metrics::StockMetrics;
pub use registry::{SelfTestReport, ToolSet};
pub use search::WebSearch;
pub use sec_filing::{FilingForm, SecFilingSearch};
pub use tool::{Capability, Tool};
