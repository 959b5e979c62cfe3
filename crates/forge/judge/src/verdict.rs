//! Judge verdicts

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of grading one test case
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub pass: bool,
    /// The candidate's value, normalized the way it was compared
    pub actual: Value,
    /// The expected value, normalized the way it was compared
    pub expected: Value,
    /// Strategy-specific diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl Verdict {
    pub fn new(pass: bool, actual: Value, expected: Value) -> Self {
        Self {
            pass,
            actual,
            expected,
            debug: None,
        }
    }

    /// A failing verdict explaining why the output could not be graded
    pub fn rejected(actual: Value, expected: Value, reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            actual,
            expected,
            debug: Some(serde_json::json!({ "reason": reason.into() })),
        }
    }

    pub fn with_debug(mut self, debug: Value) -> Self {
        self.debug = Some(debug);
        self
    }

    /// The failure reason, if one was recorded
    pub fn reason(&self) -> Option<&str> {
        self.debug.as_ref()?.get("reason")?.as_str()
    }
}
