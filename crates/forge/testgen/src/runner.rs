//! Solution runner: one call of a solution against one serialized input

use crate::error::RunError;
use forge_codec::{deserialize_value, serialize_value};
use forge_sandbox::{Binding, ExecutionRequest, ScriptSandbox};
use forge_types::{ProblemSpec, TestCase, ValueType};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// The observable result of calling a solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionRun {
    /// Arguments as they stand after the call, serialized per parameter
    /// type, so in-place mutation is visible
    pub args: Vec<Value>,
    /// Return value, serialized per the problem's return type
    pub return_value: Value,
}

/// Runs solution sources in the sandbox
#[derive(Clone)]
pub struct SolutionRunner {
    sandbox: Arc<dyn ScriptSandbox>,
    timeout: Duration,
}

impl SolutionRunner {
    pub fn new(sandbox: Arc<dyn ScriptSandbox>, timeout: Duration) -> Self {
        Self { sandbox, timeout }
    }

    pub fn sandbox(&self) -> &Arc<dyn ScriptSandbox> {
        &self.sandbox
    }

    /// Run `source` (which must define `function_name`) on a test case's
    /// inputs, shaped by the problem's signature
    pub async fn run_case(
        &self,
        problem: &ProblemSpec,
        source: &str,
        case: &TestCase,
    ) -> Result<SolutionRun, RunError> {
        self.run(
            source,
            &problem.function_name,
            &problem.parameter_types(),
            problem.return_type,
            &case.input,
        )
        .await
    }

    pub async fn run(
        &self,
        source: &str,
        function_name: &str,
        param_types: &[ValueType],
        return_type: ValueType,
        input: &[Value],
    ) -> Result<SolutionRun, RunError> {
        if input.len() != param_types.len() {
            return Err(RunError::Shape(format!(
                "{} arguments for {} parameters",
                input.len(),
                param_types.len()
            )));
        }

        let args = param_types
            .iter()
            .zip(input)
            .map(|(ty, value)| deserialize_value(*ty, value))
            .collect::<Result<Vec<_>, _>>()?;

        let body = "var result = solution.apply(null, args);\n\
                    return { args: args, returnValue: result };";
        let request = ExecutionRequest::new(body, self.timeout)
            .bind("solution", Binding::function(source, function_name))
            .bind_value("args", Value::Array(args));

        let mut result = self.sandbox.execute(request).await?;
        trace!(function = function_name, result = %result, "Solution returned");

        let Some(Value::Array(after)) = result.get_mut("args").map(Value::take) else {
            return Err(RunError::Shape("missing argument list".into()));
        };
        if after.len() != param_types.len() {
            return Err(RunError::Shape(format!(
                "argument list changed length to {}",
                after.len()
            )));
        }
        let args = param_types
            .iter()
            .zip(&after)
            .map(|(ty, value)| serialize_value(*ty, value))
            .collect::<Result<Vec<_>, _>>()?;

        let raw_return = result.get_mut("returnValue").map(Value::take).unwrap_or(Value::Null);
        let return_value = serialize_value(return_type, &raw_return)?;

        Ok(SolutionRun { args, return_value })
    }
}
