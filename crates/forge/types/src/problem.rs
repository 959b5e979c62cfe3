//! Problem specifications: the generated, immutable description of one exercise

use crate::{JudgeConfig, SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Value Types ──────────────────────────────────────────────────────

/// The closed vocabulary of parameter and return types.
///
/// Node types (`ListNode`, `TreeNode`, `_Node` and their array variants)
/// never cross a boundary as live structures: they travel in the flat
/// serialized form produced by the codec layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "number[]")]
    NumberArray,
    #[serde(rename = "number[][]")]
    NumberMatrix,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "ListNode")]
    ListNode,
    #[serde(rename = "TreeNode")]
    TreeNode,
    /// Binary tree node with a same-level `next` pointer
    #[serde(rename = "_Node")]
    NextNode,
    #[serde(rename = "ListNode[]")]
    ListNodeArray,
    #[serde(rename = "TreeNode[]")]
    TreeNodeArray,
}

impl ValueType {
    /// The name used in generated code and prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::NumberArray => "number[]",
            Self::NumberMatrix => "number[][]",
            Self::StringArray => "string[]",
            Self::ListNode => "ListNode",
            Self::TreeNode => "TreeNode",
            Self::NextNode => "_Node",
            Self::ListNodeArray => "ListNode[]",
            Self::TreeNodeArray => "TreeNode[]",
        }
    }

    /// Whether values of this type need codec conversion at a boundary
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ListNode
                | Self::TreeNode
                | Self::NextNode
                | Self::ListNodeArray
                | Self::TreeNodeArray
        )
    }

    /// Whether the serialized form of this type is a JSON array
    pub fn is_array(&self) -> bool {
        !matches!(self, Self::Number | Self::String | Self::Boolean)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Difficulty ───────────────────────────────────────────────────────

/// Difficulty rating of a problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

// ── Parameters ───────────────────────────────────────────────────────

/// One positional parameter of the canonical function
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

// ── Problem Spec ─────────────────────────────────────────────────────

/// A fully generated exercise. Immutable once accepted by the builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSpec {
    /// Derived from the title when a generated spec leaves it empty
    #[serde(default)]
    pub slug: String,
    pub title: String,
    /// Problem statement text (markdown)
    pub statement: String,
    /// Constraints text, one bound per line
    pub constraints: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub parameters: Vec<Parameter>,
    pub return_type: ValueType,
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_config: Option<JudgeConfig>,
    pub starting_code: String,
    /// Primary ("optimal") solution source; the test oracle
    pub solution: String,
    /// Secondary solution source using a different algorithm
    pub secondary_solution: String,
    #[serde(default = "default_true")]
    pub output_order_matters: bool,
}

fn default_true() -> bool {
    true
}

impl ProblemSpec {
    /// Structural validation of a freshly generated spec.
    ///
    /// Syntax of the embedded sources is checked separately by the
    /// builder, which owns a sandbox.
    pub fn validate(&self) -> SpecResult<()> {
        if self.title.trim().is_empty() {
            return Err(SpecError::MissingField("title"));
        }
        if self.statement.trim().is_empty() {
            return Err(SpecError::MissingField("statement"));
        }
        if self.solution.trim().is_empty() {
            return Err(SpecError::MissingField("solution"));
        }
        if self.secondary_solution.trim().is_empty() {
            return Err(SpecError::MissingField("secondarySolution"));
        }
        if self.starting_code.trim().is_empty() {
            return Err(SpecError::MissingField("startingCode"));
        }
        if !is_identifier(&self.function_name) {
            return Err(SpecError::InvalidFunctionName(self.function_name.clone()));
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !is_identifier(&param.name) {
                return Err(SpecError::InvalidFunctionName(param.name.clone()));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SpecError::DuplicateParameter(param.name.clone()));
            }
        }

        if let Some(JudgeConfig::MutatingArrayWithK {
            array_param_index, ..
        }) = &self.judge_config
        {
            let param = self.parameters.get(*array_param_index).ok_or(
                SpecError::ParameterIndexOutOfRange {
                    index: *array_param_index,
                    count: self.parameters.len(),
                },
            )?;
            if !matches!(
                param.value_type,
                ValueType::NumberArray | ValueType::StringArray | ValueType::NumberMatrix
            ) {
                return Err(SpecError::NotAnArrayParameter {
                    index: *array_param_index,
                    found: param.value_type.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Parameter types in positional order
    pub fn parameter_types(&self) -> Vec<ValueType> {
        self.parameters.iter().map(|p| p.value_type).collect()
    }

    /// The effective judge strategy (absent config means return-value)
    pub fn effective_judge(&self) -> JudgeConfig {
        self.judge_config.clone().unwrap_or_default()
    }
}

/// Derive a URL slug from a problem title: "Two Sum II" -> "two-sum-ii"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sum() -> ProblemSpec {
        ProblemSpec {
            slug: "two-sum".into(),
            title: "Two Sum".into(),
            statement: "Find two indices whose values add up to target.".into(),
            constraints: "2 <= nums.length <= 10".into(),
            topics: vec!["array".into(), "hash-table".into()],
            difficulty: Difficulty::Easy,
            parameters: vec![
                Parameter::new("nums", ValueType::NumberArray),
                Parameter::new("target", ValueType::Number),
            ],
            return_type: ValueType::NumberArray,
            function_name: "twoSum".into(),
            judge_config: None,
            starting_code: "function twoSum(nums, target) {\n}".into(),
            solution: "function twoSum(nums, target) { return [0, 1]; }".into(),
            secondary_solution: "function twoSum(a, t) { return [0, 1]; }".into(),
            output_order_matters: false,
        }
    }

    #[test]
    fn test_valid_spec() {
        assert!(two_sum().validate().is_ok());
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let mut spec = two_sum();
        spec.parameters[1].name = "nums".into();
        assert!(matches!(
            spec.validate(),
            Err(SpecError::DuplicateParameter(name)) if name == "nums"
        ));
    }

    #[test]
    fn test_bad_function_name_rejected() {
        let mut spec = two_sum();
        spec.function_name = "two sum".into();
        assert!(matches!(
            spec.validate(),
            Err(SpecError::InvalidFunctionName(_))
        ));
    }

    #[test]
    fn test_mutating_judge_index_checked() {
        let mut spec = two_sum();
        spec.judge_config = Some(JudgeConfig::MutatingArrayWithK {
            array_param_index: 5,
            k_is_return_value: true,
            ignore_order: false,
        });
        assert!(matches!(
            spec.validate(),
            Err(SpecError::ParameterIndexOutOfRange { index: 5, count: 2 })
        ));

        spec.judge_config = Some(JudgeConfig::MutatingArrayWithK {
            array_param_index: 1,
            k_is_return_value: true,
            ignore_order: false,
        });
        assert!(matches!(
            spec.validate(),
            Err(SpecError::NotAnArrayParameter { index: 1, .. })
        ));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(two_sum()).unwrap();
        assert_eq!(json["functionName"], "twoSum");
        assert_eq!(json["parameters"][0]["type"], "number[]");
        assert_eq!(json["difficulty"], "easy");
        assert_eq!(json["outputOrderMatters"], false);

        let back: ProblemSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, two_sum());
    }

    #[test]
    fn test_value_type_names() {
        let ty: ValueType = serde_json::from_str("\"_Node\"").unwrap();
        assert_eq!(ty, ValueType::NextNode);
        assert!(ty.is_structural());
        assert_eq!(ValueType::TreeNodeArray.as_str(), "TreeNode[]");
        assert!(!ValueType::Boolean.is_array());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Two Sum"), "two-sum");
        assert_eq!(slugify("  LRU Cache (II) "), "lru-cache-ii");
        assert_eq!(slugify("3Sum"), "3sum");
    }
}
