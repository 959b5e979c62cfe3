//! The builder orchestrator: one pipeline run as a state machine
//!
//! `idle → generating_problem → generating_tests → validating_tests →
//! finalizing → completed`, with `failed` and `cancelled` reachable from
//! every non-terminal phase. The orchestrator owns its [`BuilderState`]
//! and publishes a snapshot after every mutation; cancellation and
//! manual-finish requests arrive through [`BuilderControl`] flags that
//! are polled before and after every external call.

use crate::config::ForgeConfig;
use crate::handle::{BuilderControl, BuilderHandle};
use crate::retry::RetryPolicy;
use crate::service::GenerationService;
use crate::store::ProblemStore;
use crate::uniqueness::compare_solutions;
use forge_judge::JudgeEngine;
use forge_sandbox::{BoaSandbox, ScriptSandbox};
use forge_testgen::{CrossValidator, RetryAction, SolutionRunner, TestCaseExecutor};
use forge_types::{slugify, BuilderId, BuilderPhase, BuilderState, ProblemSpec, TestCase};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

// ── Pipeline ─────────────────────────────────────────────────────────

/// The collaborators and settings shared by every builder
#[derive(Clone)]
pub struct Pipeline {
    generation: Arc<dyn GenerationService>,
    store: Arc<dyn ProblemStore>,
    sandbox: Arc<dyn ScriptSandbox>,
    executor: TestCaseExecutor,
    validator: CrossValidator,
    retry: RetryPolicy,
    min_test_cases: usize,
}

impl Pipeline {
    /// Build a pipeline around the embedded interpreter
    pub fn new(
        config: &ForgeConfig,
        generation: Arc<dyn GenerationService>,
        store: Arc<dyn ProblemStore>,
    ) -> Self {
        let sandbox: Arc<dyn ScriptSandbox> = Arc::new(BoaSandbox::new(config.sandbox.clone()));
        Self::with_sandbox(config, generation, store, sandbox)
    }

    pub fn with_sandbox(
        config: &ForgeConfig,
        generation: Arc<dyn GenerationService>,
        store: Arc<dyn ProblemStore>,
        sandbox: Arc<dyn ScriptSandbox>,
    ) -> Self {
        Self {
            generation,
            store,
            executor: TestCaseExecutor::new(sandbox.clone(), config.executor.clone()),
            validator: cross_validator(config, sandbox.clone()),
            sandbox,
            retry: RetryPolicy::new(&config.retry),
            min_test_cases: config.validation.min_test_cases,
        }
    }

    pub fn store(&self) -> &Arc<dyn ProblemStore> {
        &self.store
    }
}

/// A cross-validator with the configured solution and judge timeouts
pub fn cross_validator(config: &ForgeConfig, sandbox: Arc<dyn ScriptSandbox>) -> CrossValidator {
    let runner = SolutionRunner::new(sandbox.clone(), config.validation.solution_timeout());
    let judge = JudgeEngine::new(sandbox, config.judge.script_timeout());
    CrossValidator::new(runner, judge)
}

// ── Internal Outcomes ────────────────────────────────────────────────

/// Why the pipeline stopped short of `completed`
#[derive(Debug)]
enum Halt {
    Cancelled,
    Failed(String),
}

/// Why a generated problem spec was not accepted
#[derive(Debug)]
enum Rejection {
    Invalid(String),
    Duplicate(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) | Self::Duplicate(msg) => f.write_str(msg),
        }
    }
}

struct Validated {
    kept: Vec<TestCase>,
    manual: bool,
}

// ── Builder ──────────────────────────────────────────────────────────

/// One run of the pipeline for a single problem name
pub struct Builder {
    pipeline: Pipeline,
    state: BuilderState,
    state_tx: watch::Sender<BuilderState>,
    control: Arc<BuilderControl>,
}

impl Builder {
    /// Create an idle builder and the handle observers use to follow it
    pub fn new(pipeline: Pipeline, problem_name: impl Into<String>) -> (Self, BuilderHandle) {
        let state = BuilderState::new(BuilderId::generate(), problem_name);
        let (state_tx, state_rx) = watch::channel(state.clone());
        let control = Arc::new(BuilderControl::default());
        let handle = BuilderHandle::new(state.builder_id.clone(), control.clone(), state_rx);
        let builder = Self {
            pipeline,
            state,
            state_tx,
            control,
        };
        (builder, handle)
    }

    pub fn id(&self) -> &BuilderId {
        &self.state.builder_id
    }

    /// Run the pipeline to a terminal phase. Never fails: every error
    /// ends up as a `failed` state with a message.
    pub async fn run(mut self) -> BuilderState {
        info!(
            builder_id = %self.state.builder_id,
            problem = %self.state.problem_name,
            "Builder started"
        );

        match self.execute().await {
            Ok(()) => {}
            Err(Halt::Cancelled) => {
                self.state.cancel();
                info!(builder_id = %self.state.builder_id, "Builder cancelled");
            }
            Err(Halt::Failed(message)) => {
                error!(builder_id = %self.state.builder_id, error = %message, "Builder failed");
                self.state.fail(message);
            }
        }
        self.publish();
        self.state
    }

    /// Terminate a builder that was cancelled before it was admitted
    pub(crate) fn abandon(mut self) -> BuilderState {
        self.state.cancel();
        info!(builder_id = %self.state.builder_id, "Builder cancelled while pending");
        self.publish();
        self.state
    }

    async fn execute(&mut self) -> Result<(), Halt> {
        self.enter(BuilderPhase::GeneratingProblem)?;
        let problem = self.generate_problem().await?;

        self.enter(BuilderPhase::GeneratingTests)?;
        let generated = self.generate_tests(&problem).await?;

        self.enter(BuilderPhase::ValidatingTests)?;
        let validated = self.validate_tests(&problem, &generated).await?;

        self.enter(BuilderPhase::Finalizing)?;
        self.finalize(&problem, validated).await
    }

    // ── State plumbing ───────────────────────────────────────────────

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn checkpoint(&self) -> Result<(), Halt> {
        if self.control.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        Ok(())
    }

    fn enter(&mut self, phase: BuilderPhase) -> Result<(), Halt> {
        self.checkpoint()?;
        self.state
            .enter_phase(phase)
            .map_err(|e| Halt::Failed(e.to_string()))?;
        info!(builder_id = %self.state.builder_id, phase = %phase, "Phase transition");
        self.publish();
        Ok(())
    }

    fn describe(&mut self, description: impl Into<String>) {
        self.state.describe(description);
        self.publish();
    }

    /// Spend one retry of the current phase, or fail if none are left
    async fn spend_retry(&mut self, what: &str, error: &str) -> Result<(), Halt> {
        let spent = self.state.retry_count;
        if !self.pipeline.retry.allows(spent) {
            return Err(Halt::Failed(format!(
                "{what} failed after {spent} retries: {error}"
            )));
        }

        self.state.record_retry(error);
        let attempt = self.state.retry_count;
        warn!(
            builder_id = %self.state.builder_id,
            phase = %self.state.phase,
            attempt,
            error = %error,
            "Retrying {what}"
        );
        self.describe(format!(
            "Retrying {what} ({attempt}/{})",
            self.pipeline.retry.max_retries
        ));
        self.backoff(self.pipeline.retry.delay(attempt)).await
    }

    async fn backoff(&self, delay: Duration) -> Result<(), Halt> {
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.control.cancelled() => {}
            }
        }
        self.checkpoint()
    }

    // ── generating_problem ───────────────────────────────────────────

    async fn generate_problem(&mut self) -> Result<ProblemSpec, Halt> {
        let mut previous_error: Option<String> = None;
        let mut regenerated_duplicate = false;

        loop {
            self.checkpoint()?;
            let result = self
                .pipeline
                .generation
                .generate_problem_spec(&self.state.problem_name, previous_error.as_deref())
                .await;
            self.checkpoint()?;

            let message = match result {
                Ok(spec) => {
                    let accepted = self.accept_problem(spec).await;
                    self.checkpoint()?;
                    match accepted {
                        Ok(spec) => {
                            info!(
                                builder_id = %self.state.builder_id,
                                slug = %spec.slug,
                                "Problem spec accepted"
                            );
                            return Ok(spec);
                        }
                        // one free regeneration before the retry budget applies
                        Err(Rejection::Duplicate(msg)) if !regenerated_duplicate => {
                            regenerated_duplicate = true;
                            warn!(builder_id = %self.state.builder_id, "{msg}");
                            self.describe("Solutions are not distinct, regenerating problem");
                            previous_error = Some(msg);
                            continue;
                        }
                        Err(rejection) => rejection.to_string(),
                    }
                }
                Err(e) => e.to_string(),
            };

            self.spend_retry("problem generation", &message).await?;
            previous_error = Some(message);
        }
    }

    async fn accept_problem(&self, mut spec: ProblemSpec) -> Result<ProblemSpec, Rejection> {
        if spec.slug.trim().is_empty() {
            spec.slug = slugify(&spec.title);
        }
        spec.validate()
            .map_err(|e| Rejection::Invalid(format!("invalid problem spec: {e}")))?;

        for (field, source) in [
            ("solution", &spec.solution),
            ("secondarySolution", &spec.secondary_solution),
            ("startingCode", &spec.starting_code),
        ] {
            if let Err(e) = self.pipeline.sandbox.check_syntax(source).await {
                return Err(Rejection::Invalid(format!("{field} does not parse: {e}")));
            }
        }

        if let Some(sameness) = compare_solutions(&spec.solution, &spec.secondary_solution) {
            return Err(Rejection::Duplicate(format!(
                "secondarySolution is {sameness} to solution; it must be an independent algorithm"
            )));
        }
        Ok(spec)
    }

    // ── generating_tests ─────────────────────────────────────────────

    async fn generate_tests(&mut self, problem: &ProblemSpec) -> Result<Vec<TestCase>, Halt> {
        let mut previous_error: Option<String> = None;
        let mut rerun: Option<String> = None;
        let mut reran = false;

        loop {
            self.checkpoint()?;
            let source = match rerun.take() {
                Some(source) => source,
                None => {
                    self.describe("Generating test factory");
                    let result = self
                        .pipeline
                        .generation
                        .generate_test_factory(problem, &[], previous_error.as_deref())
                        .await;
                    self.checkpoint()?;
                    match result {
                        Ok(source) => {
                            reran = false;
                            source
                        }
                        Err(e) => {
                            let message = e.to_string();
                            self.spend_retry("test generation", &message).await?;
                            previous_error = Some(message);
                            continue;
                        }
                    }
                }
            };

            self.describe("Running test factory");
            let result = self.pipeline.executor.execute(&source, problem, &[]).await;
            self.checkpoint()?;

            match result {
                Ok(outcome) => {
                    let count = outcome.cases.len();
                    self.state.test_case_counts.generated = count;
                    self.describe(format!("Generated {count} test cases"));
                    info!(
                        builder_id = %self.state.builder_id,
                        generated = count,
                        rejected = outcome.rejected_by_constraints,
                        duplicates = outcome.duplicates,
                        "Test factory succeeded"
                    );
                    return Ok(outcome.cases);
                }
                Err(e) => {
                    let message = e.to_string();
                    self.spend_retry("test generation", &message).await?;
                    match e.retry_action() {
                        RetryAction::RerunSameCode if !reran => {
                            reran = true;
                            rerun = Some(source);
                        }
                        _ => previous_error = Some(message),
                    }
                }
            }
        }
    }

    // ── validating_tests ─────────────────────────────────────────────

    async fn validate_tests(
        &mut self,
        problem: &ProblemSpec,
        cases: &[TestCase],
    ) -> Result<Validated, Halt> {
        let total = cases.len();
        let mut kept = Vec::with_capacity(total);

        for (i, case) in cases.iter().enumerate() {
            self.checkpoint()?;
            if self.control.finish_requested() {
                info!(
                    builder_id = %self.state.builder_id,
                    validated = i,
                    total,
                    "Finishing manually"
                );
                return Ok(Validated { kept, manual: true });
            }

            let outcome = self.pipeline.validator.validate_case(problem, case).await;
            self.checkpoint()?;

            if outcome.passed {
                self.state.test_case_counts.passed += 1;
                kept.push(case.clone());
            } else {
                self.state.test_case_counts.failed += 1;
                debug!(
                    builder_id = %self.state.builder_id,
                    case = i,
                    primary_pass = outcome.primary.pass,
                    "Test case discarded"
                );
            }
            self.describe(format!("Validated {}/{total} test cases", i + 1));
        }

        Ok(Validated {
            kept,
            manual: false,
        })
    }

    // ── finalizing ───────────────────────────────────────────────────

    async fn finalize(&mut self, problem: &ProblemSpec, validated: Validated) -> Result<(), Halt> {
        let Validated { kept, manual } = validated;
        let counts = self.state.test_case_counts;

        if kept.is_empty() {
            return Err(Halt::Failed(if manual {
                "finished manually before any test case was validated: nothing to persist".into()
            } else {
                format!(
                    "no generated test case survived cross-validation ({} discarded)",
                    counts.failed
                )
            }));
        }

        if manual {
            self.state.warn(format!(
                "Finished manually: saving {} of {} generated test cases; the set may be incomplete",
                kept.len(),
                counts.generated
            ));
        } else if kept.len() < self.pipeline.min_test_cases {
            warn!(
                builder_id = %self.state.builder_id,
                kept = kept.len(),
                minimum = self.pipeline.min_test_cases,
                "Degraded test set"
            );
            self.state.warn(format!(
                "Degraded: only {} test cases survived cross-validation (minimum {})",
                kept.len(),
                self.pipeline.min_test_cases
            ));
        }

        self.describe("Saving problem");
        // A saved problem is committed; cancellation is no longer observed.
        self.pipeline
            .store
            .save_problem(problem, &kept)
            .await
            .map_err(|e| Halt::Failed(format!("failed to save problem: {e}")))?;

        self.state.complete(format!(
            "Saved \"{}\" with {} test cases ({} discarded)",
            problem.title,
            kept.len(),
            counts.failed
        ));
        info!(
            builder_id = %self.state.builder_id,
            slug = %problem.slug,
            passed = counts.passed,
            failed = counts.failed,
            "Builder completed"
        );
        Ok(())
    }
}
