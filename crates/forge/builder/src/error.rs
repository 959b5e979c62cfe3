//! Error types for the builder and its collaborators

use forge_types::{BuilderId, BuilderPhase};
use std::time::Duration;

/// Result type for caller-facing builder operations
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by the generation service
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The request could not be served (transport, quota, upstream failure)
    #[error("Generation request failed: {0}")]
    Request(String),

    /// The service answered with something unusable
    #[error("Malformed generation result: {0}")]
    Malformed(String),

    /// A scripted service has no responses left
    #[error("No scripted {0} response left")]
    Exhausted(&'static str),
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rejected by store: {0}")]
    Rejected(String),
}

/// Errors of caller-facing operations on builders
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("Builder not found: {0}")]
    NotFound(BuilderId),

    #[error("Builder {id} cannot finish manually in phase {phase} with {generated} generated test cases")]
    NotReadyForManualFinish {
        id: BuilderId,
        phase: BuilderPhase,
        generated: usize,
    },

    #[error("Builder {0} already finished as {1}")]
    AlreadyTerminal(BuilderId, BuilderPhase),

    #[error("Builder {0} is still running in phase {1}")]
    StillRunning(BuilderId, BuilderPhase),

    #[error("Rate limited: {subject} may {operation} again in {}s", retry_after.as_secs())]
    RateLimited {
        subject: String,
        operation: String,
        retry_after: Duration,
    },
}
