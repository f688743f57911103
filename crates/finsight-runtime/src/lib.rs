//! Bounded task runner for finsight
//!
//! This crate runs a single operation on its own worker, waits for it up to a
//! caller-chosen deadline, and reports exactly one [`Outcome`]:
//! completed, failed, or timed out.
//!
//! Cancellation is advisory. On timeout the runner cancels the
//! [`CancellationToken`] it handed to the operation and returns immediately;
//! an operation that never checks the token keeps running on its detached
//! worker until it finishes on its own, and whatever it produces then is
//! discarded (and logged).
//!
//! # Example
//!
//! ```
//! use finsight_runtime::{Outcome, run};
//! use std::time::Duration;
//!
//! let outcome = run(|| Ok::<_, String>(42), Duration::from_secs(1), "answer").unwrap();
//! assert_eq!(outcome, Outcome::Completed(42));
//! ```

pub mod deadline;
pub mod error;
pub mod outcome;
pub mod runner;

// Re-export key types
pub use deadline::{AnalysisKind, DEFAULT_ANALYSIS_TIMEOUT, DeadlinePolicy, PROBE_DEADLINE};
pub use error::{Result, RunnerError};
pub use outcome::{Failure, Outcome};
pub use runner::{run, run_async, run_cancellable};
pub use tokio_util::sync::CancellationToken;
