//! Terminal outcome of one bounded invocation

use std::fmt;
use std::time::Duration;

/// The single terminal result of a runner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The operation returned a value before the deadline
    Completed(T),

    /// The operation failed before the deadline
    Failed(Failure<E>),

    /// The deadline elapsed first; the worker was signalled and detached
    TimedOut {
        /// The deadline that elapsed
        deadline: Duration,
    },
}

/// How an operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure<E> {
    /// The operation returned an error; carried through untouched
    Error(E),

    /// The operation panicked; holds the panic message
    Panicked(String),
}

impl<T, E> Outcome<T, E> {
    /// Lift a plain result into an outcome
    ///
    /// Used by callers that opt out of deadline enforcement and still want a
    /// single branch point.
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(error) => Self::Failed(Failure::Error(error)),
        }
    }

    /// Whether the operation completed
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the operation failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether the deadline elapsed
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// The completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Map the completed value
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Completed(value) => Outcome::Completed(f(value)),
            Self::Failed(failure) => Outcome::Failed(failure),
            Self::TimedOut { deadline } => Outcome::TimedOut { deadline },
        }
    }

    /// Short name for logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::TimedOut { .. } => "timed out",
        }
    }
}

impl<E> Failure<E> {
    /// The operation's own error, if it returned one
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Error(error) => Some(error),
            Self::Panicked(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => write!(f, "{error}"),
            Self::Panicked(message) => write!(f, "operation panicked: {message}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Failure<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: Outcome<i32, String> = Outcome::from_result(Ok(1));
        assert_eq!(ok, Outcome::Completed(1));

        let err: Outcome<i32, String> = Outcome::from_result(Err("bad".to_string()));
        assert_eq!(err, Outcome::Failed(Failure::Error("bad".to_string())));
        assert!(err.is_failed());
    }

    #[test]
    fn test_map_preserves_failure() {
        let timed_out: Outcome<i32, String> = Outcome::TimedOut {
            deadline: Duration::from_secs(1),
        };
        let mapped = timed_out.map(|v| v * 2);
        assert!(mapped.is_timed_out());
        assert_eq!(mapped.kind(), "timed out");

        let done: Outcome<i32, String> = Outcome::Completed(21);
        assert_eq!(done.map(|v| v * 2).completed(), Some(42));
    }

    #[test]
    fn test_failure_display() {
        let failure: Failure<String> = Failure::Error("division by zero".to_string());
        assert_eq!(failure.to_string(), "division by zero");
        assert_eq!(failure.error().map(String::as_str), Some("division by zero"));

        let panicked: Failure<String> = Failure::Panicked("boom".to_string());
        assert_eq!(panicked.to_string(), "operation panicked: boom");
        assert!(panicked.error().is_none());
    }
}
