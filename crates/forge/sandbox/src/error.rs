//! Error types for sandboxed execution
//!
//! Every failure of a sandboxed script is reported as one of these
//! variants. Callers use [`ExecutionError::is_syntax`] and
//! [`ExecutionError::is_timeout`] to pick a retry strategy.

use std::time::Duration;

/// Result type alias for sandbox operations
pub type SandboxResult<T> = Result<T, ExecutionError>;

/// Sandboxed execution error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    /// The source failed to parse
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The script threw an exception
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Wall-clock timeout elapsed before the script finished
    #[error("Execution timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// An interpreter limit (loop iterations, recursion depth) was hit
    #[error("Resource limit exceeded: {0}")]
    LimitExceeded(String),

    /// The script finished but its result could not be read back
    #[error("Invalid script output: {0}")]
    InvalidOutput(String),

    /// Failure of the sandbox itself (worker thread, bad binding name)
    #[error("Sandbox internal error: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// Defects in the source itself; rerunning the same code cannot help
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    /// Runaway executions, bounded by the clock or an interpreter limit
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::LimitExceeded(_))
    }
}

impl From<serde_json::Error> for ExecutionError {
    fn from(err: serde_json::Error) -> Self {
        ExecutionError::InvalidOutput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutionError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Execution timed out after 1500ms");

        let err = ExecutionError::Runtime("TypeError: x is undefined".into());
        assert_eq!(err.to_string(), "Runtime error: TypeError: x is undefined");
    }

    #[test]
    fn test_classification() {
        assert!(ExecutionError::Syntax("unexpected token".into()).is_syntax());
        assert!(ExecutionError::LimitExceeded("loop".into()).is_timeout());
        assert!(!ExecutionError::Runtime("boom".into()).is_timeout());
        assert!(!ExecutionError::Internal("join".into()).is_syntax());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: ExecutionError = json_err.into();
        assert!(matches!(err, ExecutionError::InvalidOutput(_)));
    }
}
