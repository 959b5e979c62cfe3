//! Error types for the codec layer

use forge_types::ValueType;

/// Errors raised by codec conversions
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Expected serialized {expected}, found {found}")]
    UnexpectedShape { expected: ValueType, found: String },

    #[error("Node graph index {0} is out of range")]
    DanglingIndex(usize),

    #[error("Cycle detected while walking node graph")]
    Cycle,

    #[error("Tree node {0} is reachable from more than one parent")]
    SharedNode(usize),

    #[error("Malformed level marker array: {0}")]
    MalformedLevels(String),

    #[error("Value is not a node: {0}")]
    NotANode(String),

    #[error("Invalid node graph: {0}")]
    InvalidGraph(#[from] serde_json::Error),
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

pub(crate) fn describe(value: &serde_json::Value) -> String {
    let text = value.to_string();
    if text.len() > 80 {
        format!("{}...", &text[..text.char_indices().nth(77).map_or(text.len(), |(i, _)| i)])
    } else {
        text
    }
}
