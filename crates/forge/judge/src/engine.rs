//! Judge engine: strategy dispatch

use crate::mutating::judge_mutating;
use crate::Verdict;
use forge_compare::{normalize_unordered, round_to_5_decimals, values_equal};
use forge_sandbox::{ExecutionRequest, ScriptSandbox};
use forge_types::{JudgeConfig, TestCase};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Grades candidate output against a test case.
///
/// The engine never fails: malformed candidate output, a misbehaving
/// custom judge or a sandbox error all become failing verdicts.
#[derive(Clone)]
pub struct JudgeEngine {
    sandbox: Arc<dyn ScriptSandbox>,
    script_timeout: Duration,
}

impl JudgeEngine {
    pub fn new(sandbox: Arc<dyn ScriptSandbox>, script_timeout: Duration) -> Self {
        Self {
            sandbox,
            script_timeout,
        }
    }

    /// Grade one test case.
    ///
    /// `runtime_args` are the arguments as they stand after the candidate
    /// call (in-place mutation is visible); `return_value` is what the
    /// candidate returned. An absent config means return-value judging.
    pub async fn judge(
        &self,
        config: Option<&JudgeConfig>,
        runtime_args: &[Value],
        return_value: &Value,
        test_case: &TestCase,
        output_order_matters: bool,
    ) -> Verdict {
        let verdict = match config.unwrap_or(&JudgeConfig::ReturnValue) {
            JudgeConfig::ReturnValue => {
                judge_return_value(return_value, &test_case.output, output_order_matters)
            }
            JudgeConfig::MutatingArrayWithK {
                array_param_index,
                k_is_return_value,
                ignore_order,
            } => judge_mutating(
                *array_param_index,
                *k_is_return_value,
                *ignore_order,
                runtime_args,
                return_value,
                &test_case.output,
            ),
            JudgeConfig::CustomScript { script } => {
                self.judge_custom(script, runtime_args, return_value, &test_case.output)
                    .await
            }
        };

        if !verdict.pass {
            debug!(
                strategy = config.map_or("returnValue", JudgeConfig::kind_name),
                actual = %verdict.actual,
                expected = %verdict.expected,
                "Verdict: fail"
            );
        }
        verdict
    }

    /// Run a problem's `judge` function with the full sandbox prelude
    async fn judge_custom(
        &self,
        script: &str,
        runtime_args: &[Value],
        return_value: &Value,
        expected: &Value,
    ) -> Verdict {
        let body = format!(
            "{script}\n\
             if (typeof judge !== \"function\") {{\n\
             throw new Error(\"custom judge script does not define judge(args, returnValue, expected)\");\n\
             }}\n\
             return judge(args, returnValue, expected);"
        );
        let request = ExecutionRequest::new(body, self.script_timeout)
            .bind_value("args", Value::Array(runtime_args.to_vec()))
            .bind_value("returnValue", return_value.clone())
            .bind_value("expected", expected.clone());

        match self.sandbox.execute(request).await {
            Ok(result) => read_script_verdict(result, return_value, expected),
            Err(e) => Verdict::rejected(
                return_value.clone(),
                expected.clone(),
                format!("custom judge failed: {e}"),
            ),
        }
    }
}

/// Round both sides, normalize when order does not matter, then compare
pub fn judge_return_value(return_value: &Value, expected: &Value, order_matters: bool) -> Verdict {
    let mut actual = round_to_5_decimals(return_value);
    let mut expected = round_to_5_decimals(expected);
    if !order_matters {
        actual = normalize_unordered(&actual);
        expected = normalize_unordered(&expected);
    }
    let pass = values_equal(&actual, &expected);
    Verdict::new(pass, actual, expected)
}

/// Validate a custom judge's `{pass: boolean, actual?, expected?}` result
fn read_script_verdict(result: Value, return_value: &Value, expected: &Value) -> Verdict {
    let Some(obj) = result.as_object() else {
        return Verdict::rejected(
            return_value.clone(),
            expected.clone(),
            format!("custom judge returned {result}, expected an object"),
        );
    };
    let Some(pass) = obj.get("pass").and_then(Value::as_bool) else {
        return Verdict::rejected(
            return_value.clone(),
            expected.clone(),
            "custom judge result has no boolean `pass`",
        );
    };

    let actual = obj.get("actual").cloned().unwrap_or_else(|| return_value.clone());
    let expected = obj.get("expected").cloned().unwrap_or_else(|| expected.clone());
    let verdict = Verdict::new(pass, actual, expected);
    match obj.get("debug") {
        Some(debug) => verdict.with_debug(debug.clone()),
        None => verdict.with_debug(json!({ "strategy": "customScript" })),
    }
}
