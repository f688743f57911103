//! Error types for workflow execution

use finsight_llm::LLMError;
use thiserror::Error;

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that can occur while building or running a workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A model call failed
    #[error("Task '{task}' failed: {source}")]
    Task {
        task: String,
        #[source]
        source: LLMError,
    },

    /// The run was cancelled between or during tasks
    #[error("Analysis cancelled after {completed} of {total} tasks")]
    Cancelled { completed: usize, total: usize },

    /// No usable ticker symbols were supplied
    #[error("No valid stock ticker symbols provided")]
    NoTickers,

    /// More tasks than a run may hold
    #[error("Workflow has {0} tasks; at most {max} are allowed", max = crate::MAX_TASKS)]
    TooManyTasks(usize),

    /// Invalid investor profile value
    #[error("Invalid investor profile: {0}")]
    InvalidProfile(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WorkflowError {
    /// The model error behind a task failure, if any
    pub fn llm_error(&self) -> Option<&LLMError> {
        match self {
            WorkflowError::Task { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkflowError::Cancelled {
            completed: 1,
            total: 4,
        };
        assert_eq!(err.to_string(), "Analysis cancelled after 1 of 4 tasks");
        assert_eq!(
            WorkflowError::TooManyTasks(5).to_string(),
            "Workflow has 5 tasks; at most 4 are allowed"
        );
    }

    #[test]
    fn test_llm_error_accessor() {
        let err = WorkflowError::Task {
            task: "Research".to_string(),
            source: LLMError::RateLimitExceeded("quota".to_string()),
        };
        assert!(matches!(err.llm_error(), Some(LLMError::RateLimitExceeded(_))));
        assert!(WorkflowError::NoTickers.llm_error().is_none());
    }
}
