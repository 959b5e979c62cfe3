//! Error types for the Forge data model

use crate::BuilderPhase;

/// Errors raised while validating domain values
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid function name: {0:?}")]
    InvalidFunctionName(String),

    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),

    #[error("Judge config references parameter {index} but only {count} exist")]
    ParameterIndexOutOfRange { index: usize, count: usize },

    #[error("Judge config expects an array parameter at index {index}, found {found}")]
    NotAnArrayParameter { index: usize, found: String },

    #[error("Test case has {found} inputs, expected {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition { from: BuilderPhase, to: BuilderPhase },
}

/// Result type alias for data model validation
pub type SpecResult<T> = Result<T, SpecError>;
