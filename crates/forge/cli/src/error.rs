//! CLI error types

use forge_builder::StoreError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Problem store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The command ran but did not succeed
    #[error("{0}")]
    Unsuccessful(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
