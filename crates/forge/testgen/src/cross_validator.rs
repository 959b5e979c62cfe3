//! Dual-solution cross-validation
//!
//! A generated case is trusted only when both the primary and the
//! secondary solution pass it under the problem's judge. Disagreement
//! is a quality signal, not an error.

use crate::runner::SolutionRunner;
use forge_judge::{JudgeEngine, Verdict};
use forge_types::{ProblemSpec, TestCase};
use tracing::debug;

/// Which of the two solutions a verdict belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionRole {
    Primary,
    Secondary,
}

impl SolutionRole {
    fn source<'a>(&self, problem: &'a ProblemSpec) -> &'a str {
        match self {
            Self::Primary => &problem.solution,
            Self::Secondary => &problem.secondary_solution,
        }
    }
}

/// Cross-validation result for one case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub passed: bool,
    pub primary: Verdict,
    /// Absent when the primary already failed
    pub secondary: Option<Verdict>,
}

/// Partition of a batch into kept and discarded cases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossValidation {
    pub kept: Vec<TestCase>,
    pub discarded: Vec<TestCase>,
}

/// Runs both solutions over generated cases
#[derive(Clone)]
pub struct CrossValidator {
    runner: SolutionRunner,
    judge: JudgeEngine,
}

impl CrossValidator {
    pub fn new(runner: SolutionRunner, judge: JudgeEngine) -> Self {
        Self { runner, judge }
    }

    /// Grade arbitrary candidate code on one case
    pub async fn grade(&self, problem: &ProblemSpec, source: &str, case: &TestCase) -> Verdict {
        match self.runner.run_case(problem, source, case).await {
            Ok(run) => {
                self.judge
                    .judge(
                        problem.judge_config.as_ref(),
                        &run.args,
                        &run.return_value,
                        case,
                        problem.output_order_matters,
                    )
                    .await
            }
            Err(e) => Verdict::rejected(
                serde_json::Value::Null,
                case.output.clone(),
                format!("solution failed to run: {e}"),
            ),
        }
    }

    pub async fn grade_role(
        &self,
        problem: &ProblemSpec,
        role: SolutionRole,
        case: &TestCase,
    ) -> Verdict {
        self.grade(problem, role.source(problem), case).await
    }

    /// Validate one case against both solutions
    pub async fn validate_case(&self, problem: &ProblemSpec, case: &TestCase) -> CaseOutcome {
        let primary = self.grade_role(problem, SolutionRole::Primary, case).await;
        if !primary.pass {
            return CaseOutcome {
                passed: false,
                primary,
                secondary: None,
            };
        }
        let secondary = self.grade_role(problem, SolutionRole::Secondary, case).await;
        CaseOutcome {
            passed: secondary.pass,
            primary,
            secondary: Some(secondary),
        }
    }

    /// Validate a whole batch, keeping the cases both solutions pass
    pub async fn validate_all(&self, problem: &ProblemSpec, cases: &[TestCase]) -> CrossValidation {
        let mut result = CrossValidation::default();
        for case in cases {
            let outcome = self.validate_case(problem, case).await;
            if outcome.passed {
                result.kept.push(case.clone());
            } else {
                let failing = outcome.secondary.as_ref().unwrap_or(&outcome.primary);
                debug!(
                    problem = %problem.slug,
                    input = %serde_json::Value::Array(case.input.clone()),
                    primary_pass = outcome.primary.pass,
                    actual = %failing.actual,
                    expected = %failing.expected,
                    "Discarding test case"
                );
                result.discarded.push(case.clone());
            }
        }
        result
    }
}
