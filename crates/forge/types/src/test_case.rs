//! Test cases in serialized form

use crate::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One test case. Structural values are always serialized (flat arrays
/// with `null` / `"#"` markers), never live structures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Positional argument values
    pub input: Vec<Value>,
    /// Expected output
    pub output: Value,
}

impl TestCase {
    pub fn new(input: Vec<Value>, output: Value) -> Self {
        Self { input, output }
    }

    /// Check the input arity against the problem's parameter count
    pub fn check_arity(&self, parameter_count: usize) -> SpecResult<()> {
        if self.input.len() != parameter_count {
            return Err(SpecError::ArityMismatch {
                expected: parameter_count,
                found: self.input.len(),
            });
        }
        Ok(())
    }

    /// A canonical key of the input, used for duplicate suppression
    pub fn input_key(&self) -> String {
        Value::Array(self.input.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arity() {
        let case = TestCase::new(vec![json!([2, 7, 11, 15]), json!(9)], json!([0, 1]));
        assert!(case.check_arity(2).is_ok());
        assert!(matches!(
            case.check_arity(3),
            Err(SpecError::ArityMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_input_key_ignores_output() {
        let a = TestCase::new(vec![json!([1, 2]), json!(3)], json!([0, 1]));
        let b = TestCase::new(vec![json!([1, 2]), json!(3)], json!([1, 0]));
        assert_eq!(a.input_key(), b.input_key());
    }
}
