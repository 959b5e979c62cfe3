//! Grade a candidate solution against a saved problem

use crate::error::{CliError, CliResult};
use forge_builder::{cross_validator, ForgeConfig, JsonFileProblemStore};
use forge_sandbox::{BoaSandbox, ScriptSandbox};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// One graded case
#[derive(Debug, Serialize)]
struct CaseReport {
    case: usize,
    pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    actual: Value,
    expected: Value,
}

pub async fn execute(config: &ForgeConfig, problem: &Path, solution: &Path, json: bool) -> CliResult<()> {
    let saved = JsonFileProblemStore::read_file(problem).await?;
    let source = tokio::fs::read_to_string(solution)
        .await
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", solution.display())))?;

    let sandbox: Arc<dyn ScriptSandbox> = Arc::new(BoaSandbox::new(config.sandbox.clone()));
    if let Err(e) = sandbox.check_syntax(&source).await {
        return Err(CliError::InvalidInput(format!("solution does not parse: {e}")));
    }
    let validator = cross_validator(config, sandbox);

    let mut reports = Vec::with_capacity(saved.test_cases.len());
    for (i, case) in saved.test_cases.iter().enumerate() {
        let verdict = validator.grade(&saved.problem, &source, case).await;
        reports.push(CaseReport {
            case: i + 1,
            pass: verdict.pass,
            reason: verdict.reason().map(str::to_string),
            actual: verdict.actual,
            expected: verdict.expected,
        });
    }

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.pass).count();
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            let mark = if report.pass { "PASS" } else { "FAIL" };
            match &report.reason {
                Some(reason) => println!("case {:>3}  {mark}  {reason}", report.case),
                None if report.pass => println!("case {:>3}  {mark}", report.case),
                None => println!(
                    "case {:>3}  {mark}  expected {} got {}",
                    report.case, report.expected, report.actual
                ),
            }
        }
        println!("{passed}/{total} passed for \"{}\"", saved.problem.title);
    }

    if passed == total {
        Ok(())
    } else {
        Err(CliError::Unsuccessful(format!("{} of {total} test cases failed", total - passed)))
    }
}
