//! Judge configuration: which strategy grades a candidate's output

use serde::{Deserialize, Serialize};

/// The grading strategy for a problem.
///
/// Serialized with a `kind` tag: `{"kind": "mutatingArrayWithK", ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JudgeConfig {
    /// Compare the candidate's return value with the expected output
    #[default]
    ReturnValue,

    /// The candidate mutates one array argument in place and yields a
    /// count `k`; the first `k` elements of the mutated array are graded.
    MutatingArrayWithK {
        #[serde(rename = "arrayParamIndex")]
        array_param_index: usize,
        #[serde(rename = "kIsReturnValue", default = "default_true")]
        k_is_return_value: bool,
        #[serde(rename = "ignoreOrder", default)]
        ignore_order: bool,
    },

    /// A script defining `judge(args, returnValue, expected)`
    CustomScript { script: String },
}

fn default_true() -> bool {
    true
}

impl JudgeConfig {
    /// Short strategy name for logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ReturnValue => "returnValue",
            Self::MutatingArrayWithK { .. } => "mutatingArrayWithK",
            Self::CustomScript { .. } => "customScript",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_wire_format() {
        let config: JudgeConfig = serde_json::from_str(
            r#"{"kind":"mutatingArrayWithK","arrayParamIndex":0,"kIsReturnValue":true,"ignoreOrder":true}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            JudgeConfig::MutatingArrayWithK {
                array_param_index: 0,
                k_is_return_value: true,
                ignore_order: true,
            }
        );

        let plain: JudgeConfig = serde_json::from_str(r#"{"kind":"returnValue"}"#).unwrap();
        assert_eq!(plain, JudgeConfig::ReturnValue);
        assert_eq!(JudgeConfig::default(), JudgeConfig::ReturnValue);
    }

    #[test]
    fn test_mutating_defaults() {
        let config: JudgeConfig =
            serde_json::from_str(r#"{"kind":"mutatingArrayWithK","arrayParamIndex":2}"#).unwrap();
        assert_eq!(
            config,
            JudgeConfig::MutatingArrayWithK {
                array_param_index: 2,
                k_is_return_value: true,
                ignore_order: false,
            }
        );
        assert_eq!(config.kind_name(), "mutatingArrayWithK");
    }
}
