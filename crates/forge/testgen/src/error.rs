//! Error types for test-case generation

use forge_codec::CodecError;
use forge_sandbox::ExecutionError;
use std::time::Duration;

/// Result type alias for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// How the orchestrator should respond to a failed generator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// The code may be fine; run it again
    RerunSameCode,
    /// The code is defective; ask for a new generator
    Regenerate,
}

/// Test-case generation errors
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Generator has a syntax error: {0}")]
    Syntax(String),

    #[error(
        "Generator did not finish within {}s. The most likely cause is generated inputs \
         that violate the problem constraints: unbounded sizes make the reference solution \
         run far too long. Keep every input within the stated bounds.",
        after.as_secs_f64()
    )]
    Timeout { after: Duration },

    #[error("Generator threw: {0}")]
    Runtime(String),

    #[error("Generator output rejected: {0}")]
    Validation(String),

    #[error("Generated value could not be normalized: {0}")]
    Codec(#[from] CodecError),
}

/// Failure to run a solution against one test case
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Could not convert a value: {0}")]
    Codec(#[from] CodecError),

    #[error("Solution run returned an unexpected shape: {0}")]
    Shape(String),
}

impl ExecutorError {
    pub fn retry_action(&self) -> RetryAction {
        match self {
            Self::Timeout { .. } => RetryAction::RerunSameCode,
            Self::Syntax(_) | Self::Runtime(_) | Self::Validation(_) | Self::Codec(_) => {
                RetryAction::Regenerate
            }
        }
    }

    /// Translate a sandbox failure of the generator
    pub fn from_execution(err: ExecutionError, timeout: Duration) -> Self {
        match err {
            ExecutionError::Syntax(msg) => Self::Syntax(msg),
            ExecutionError::Timeout { after } => Self::Timeout { after },
            ExecutionError::LimitExceeded(_) => Self::Timeout { after: timeout },
            ExecutionError::Runtime(msg) | ExecutionError::Internal(msg) => Self::Runtime(msg),
            ExecutionError::InvalidOutput(msg) => Self::Validation(msg),
        }
    }
}
