//! Test-case generation executor
//!
//! Runs a generated test factory in the sandbox, then turns its raw
//! output into a trusted batch: shape validation, arity, codec
//! normalization, constraint checks and duplicate suppression.

use crate::constraints::Constraints;
use crate::error::{ExecutorError, ExecutorResult};
use forge_codec::serialize_value;
use forge_sandbox::{Binding, ExecutionRequest, ScriptSandbox};
use forge_types::{JudgeConfig, ProblemSpec, TestCase};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ── Configuration ────────────────────────────────────────────────────

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Hard wall-clock bound on one generator run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of generated cases logged at debug level
    #[serde(default = "default_sample_log_size")]
    pub sample_log_size: usize,
    /// Cases beyond this count are dropped
    #[serde(default = "default_max_cases")]
    pub max_cases: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_sample_log_size() -> usize {
    3
}

fn default_max_cases() -> usize {
    500
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            sample_log_size: default_sample_log_size(),
            max_cases: default_max_cases(),
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_cases(mut self, max_cases: usize) -> Self {
        self.max_cases = max_cases;
        self
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

/// A validated batch of generated cases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutcome {
    pub cases: Vec<TestCase>,
    /// Cases dropped for breaking a parsed constraint
    pub rejected_by_constraints: usize,
    /// Cases dropped as repeats of an existing or earlier input
    pub duplicates: usize,
    /// Cases dropped beyond `max_cases`
    pub truncated: usize,
}

/// How a generator source is shaped
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceForm {
    /// A single expression: a function taking the context (arrow,
    /// anonymous or named), or the cases themselves
    Expression,
    /// Statements using `context`. When they fall through without
    /// returning, `entry` names the one top-level function to call.
    Body { entry: Option<String> },
}

impl SourceForm {
    fn invocation(&self, source: &str) -> String {
        match self {
            Self::Expression => format!(
                "var generator = (\n{source}\n);\n\
                 return typeof generator === \"function\" ? generator(context) : generator;"
            ),
            Self::Body { entry } => {
                let fallback = entry
                    .as_ref()
                    .map(|name| {
                        format!("\nif (typeof {name} === \"function\") return {name}(context);")
                    })
                    .unwrap_or_default();
                format!("return (function (context) {{\n{source}\n{fallback}\n}})(context);")
            }
        }
    }
}

// ── Executor ─────────────────────────────────────────────────────────

/// Executes generated test factories
#[derive(Clone)]
pub struct TestCaseExecutor {
    sandbox: Arc<dyn ScriptSandbox>,
    config: ExecutorConfig,
}

impl TestCaseExecutor {
    pub fn new(sandbox: Arc<dyn ScriptSandbox>, config: ExecutorConfig) -> Self {
        Self { sandbox, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `source` against `problem` and validate what it produces.
    ///
    /// `existing` cases are passed to the generator and used for
    /// duplicate suppression.
    pub async fn execute(
        &self,
        source: &str,
        problem: &ProblemSpec,
        existing: &[TestCase],
    ) -> ExecutorResult<GenerationOutcome> {
        let form = self.classify(source).await?;
        let body = format!("context.solution = solution;\n{}", form.invocation(source));

        let timeout = self.config.timeout();
        let request = ExecutionRequest::new(body, timeout)
            .bind(
                "solution",
                Binding::function(&problem.solution, &problem.function_name),
            )
            .bind_value("context", generator_context(problem, existing));

        let raw = self
            .sandbox
            .execute(request)
            .await
            .map_err(|e| ExecutorError::from_execution(e, timeout))?;

        let generated = parse_cases(raw, problem)?;
        let outcome = self.filter(generated, problem, existing)?;
        self.log_samples(problem, &outcome);
        Ok(outcome)
    }

    async fn classify(&self, source: &str) -> ExecutorResult<SourceForm> {
        let expression = format!("return (\n{source}\n);");
        if self.sandbox.check_syntax(&expression).await.is_ok() {
            return Ok(SourceForm::Expression);
        }
        match self.sandbox.check_syntax(source).await {
            Ok(()) => {
                let declared = top_level_functions(source);
                let entry = match declared.as_slice() {
                    [only] => Some(only.clone()),
                    _ => None,
                };
                Ok(SourceForm::Body { entry })
            }
            Err(e) if e.is_syntax() => Err(ExecutorError::Syntax(e.to_string())),
            Err(e) => Err(ExecutorError::from_execution(e, self.config.timeout())),
        }
    }

    fn filter(
        &self,
        generated: Vec<TestCase>,
        problem: &ProblemSpec,
        existing: &[TestCase],
    ) -> ExecutorResult<GenerationOutcome> {
        if generated.is_empty() {
            return Err(ExecutorError::Validation(
                "generator returned an empty array".into(),
            ));
        }

        let constraints = Constraints::parse(&problem.constraints, &problem.parameters);
        let mut seen: HashSet<String> = existing.iter().map(TestCase::input_key).collect();
        let mut outcome = GenerationOutcome::default();

        for case in generated {
            if let Err(violation) = constraints.check(&case) {
                debug!(%violation, "Generated case rejected by constraints");
                outcome.rejected_by_constraints += 1;
                continue;
            }
            if !seen.insert(case.input_key()) {
                outcome.duplicates += 1;
                continue;
            }
            if outcome.cases.len() == self.config.max_cases {
                outcome.truncated += 1;
                continue;
            }
            outcome.cases.push(case);
        }

        if outcome.cases.is_empty() {
            let reason = if outcome.duplicates == 0 {
                format!(
                    "all {} generated cases violate the constraints:\n{}",
                    outcome.rejected_by_constraints, problem.constraints
                )
            } else {
                format!(
                    "no new cases: {} duplicates of existing inputs, {} constraint violations",
                    outcome.duplicates, outcome.rejected_by_constraints
                )
            };
            return Err(ExecutorError::Validation(reason));
        }

        if outcome.rejected_by_constraints > 0 {
            warn!(
                problem = %problem.slug,
                rejected = outcome.rejected_by_constraints,
                kept = outcome.cases.len(),
                "Generator produced cases outside the constraints"
            );
        }
        Ok(outcome)
    }

    fn log_samples(&self, problem: &ProblemSpec, outcome: &GenerationOutcome) {
        info!(
            problem = %problem.slug,
            cases = outcome.cases.len(),
            duplicates = outcome.duplicates,
            truncated = outcome.truncated,
            "Generator produced test cases"
        );
        for (i, case) in outcome
            .cases
            .iter()
            .take(self.config.sample_log_size)
            .enumerate()
        {
            debug!(
                sample = i,
                input = %serde_json::Value::Array(case.input.clone()),
                output = %case.output,
                "Generated case"
            );
        }
    }
}

/// The context bundle handed to a generator (the solution is attached
/// inside the sandbox)
fn generator_context(problem: &ProblemSpec, existing: &[TestCase]) -> Value {
    json!({
        "existingTests": existing,
        "constraints": problem.constraints,
        "parameters": problem.parameters,
        "functionName": problem.function_name,
        "returnType": problem.return_type,
        "outputOrderMatters": problem.output_order_matters,
        "judgeConfig": problem.judge_config,
        "problem": {
            "title": problem.title,
            "statement": problem.statement,
            "difficulty": problem.difficulty,
        },
    })
}

/// Validate the generator's raw result and normalize every value into
/// serialized form
fn parse_cases(raw: Value, problem: &ProblemSpec) -> ExecutorResult<Vec<TestCase>> {
    let Value::Array(items) = raw else {
        return Err(ExecutorError::Validation(format!(
            "generator returned {}, expected an array of {{input, output}}",
            kind_of(&raw)
        )));
    };

    // Outputs of a mutating or custom judge are not necessarily of the
    // declared return type; they are kept as produced.
    let normalize_output = matches!(
        problem.judge_config,
        None | Some(JudgeConfig::ReturnValue)
    );
    let types = problem.parameter_types();

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(mut fields) = item else {
                return Err(ExecutorError::Validation(format!(
                    "case {i} is {}, expected an object",
                    kind_of(&item)
                )));
            };
            let Some(Value::Array(input)) = fields.remove("input") else {
                return Err(ExecutorError::Validation(format!(
                    "case {i} has no `input` array"
                )));
            };
            let Some(output) = fields.remove("output") else {
                return Err(ExecutorError::Validation(format!(
                    "case {i} has no `output`"
                )));
            };

            let case = TestCase::new(input, output);
            case.check_arity(types.len())
                .map_err(|e| ExecutorError::Validation(format!("case {i}: {e}")))?;

            let input = types
                .iter()
                .zip(&case.input)
                .map(|(ty, value)| serialize_value(*ty, value))
                .collect::<Result<Vec<_>, _>>()?;
            let output = if normalize_output {
                serialize_value(problem.return_type, &case.output)?
            } else {
                case.output
            };
            Ok(TestCase::new(input, output))
        })
        .collect()
}

/// Names of the functions declared at the top level of a script body.
///
/// Strings, template literals and comments are skipped. A `function`
/// keyword counts as a declaration only at nesting depth zero and at the
/// start of a statement, so function expressions are not reported.
fn top_level_functions(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut statement_start = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            '"' | '\'' | '`' => {
                i += 1;
                while i < chars.len() && chars[i] != c {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                statement_start = false;
            }
            '{' | '(' | '[' => {
                depth += 1;
                statement_start = c == '{';
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                statement_start = c == '}';
            }
            ';' => statement_start = true,
            c if c.is_whitespace() => {}
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word == "function" && depth == 0 && statement_start {
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    let name_start = i;
                    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                        i += 1;
                    }
                    if i > name_start {
                        names.push(chars[name_start..i].iter().collect());
                    }
                }
                statement_start = false;
                continue;
            }
            _ => statement_start = false,
        }
        i += 1;
    }
    names
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
