//! Builder state: the progress record of one pipeline run
//!
//! A `BuilderState` is owned by exactly one orchestrator. Observers only
//! ever see cloned snapshots of it.

use crate::{SpecError, SpecResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Builder Identifier ───────────────────────────────────────────────

/// Unique identifier for a builder run
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuilderId(pub String);

impl BuilderId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for BuilderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Builder Phase ────────────────────────────────────────────────────

/// The builder state machine.
///
/// `idle → generating_problem → generating_tests → validating_tests →
/// finalizing → completed`. `failed` and `cancelled` are reachable from
/// every non-terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuilderPhase {
    #[default]
    Idle,
    GeneratingProblem,
    GeneratingTests,
    ValidatingTests,
    Finalizing,
    Completed,
    Failed,
    Cancelled,
}

impl BuilderPhase {
    /// Check if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    fn ordinal(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::GeneratingProblem => 1,
            Self::GeneratingTests => 2,
            Self::ValidatingTests => 3,
            Self::Finalizing => 4,
            Self::Completed | Self::Failed | Self::Cancelled => 5,
        }
    }

    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: BuilderPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed | Self::Cancelled => true,
            Self::Completed => *self == Self::Finalizing,
            Self::Idle => false,
            _ => next.ordinal() == self.ordinal() + 1,
        }
    }

    /// Default human-readable description of the phase
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start",
            Self::GeneratingProblem => "Generating problem statement and solutions",
            Self::GeneratingTests => "Generating test cases",
            Self::ValidatingTests => "Cross-validating test cases against both solutions",
            Self::Finalizing => "Saving problem and test cases",
            Self::Completed => "Problem built successfully",
            Self::Failed => "Build failed",
            Self::Cancelled => "Build cancelled",
        }
    }
}

impl std::fmt::Display for BuilderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::GeneratingProblem => "generating_problem",
            Self::GeneratingTests => "generating_tests",
            Self::ValidatingTests => "validating_tests",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

// ── Counters ─────────────────────────────────────────────────────────

/// Test case counters surfaced as a quality signal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseCounts {
    /// Cases produced by the generator (after structural checks)
    pub generated: usize,
    /// Cases both solutions agreed on
    pub passed: usize,
    /// Cases discarded by cross-validation
    pub failed: usize,
}

impl TestCaseCounts {
    /// Cases not yet cross-validated
    pub fn remaining(&self) -> usize {
        self.generated.saturating_sub(self.passed + self.failed)
    }
}

// ── Builder State ────────────────────────────────────────────────────

/// Mutable progress record of one builder run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderState {
    pub builder_id: BuilderId,
    pub problem_name: String,
    pub phase: BuilderPhase,
    pub phase_start_time: DateTime<Utc>,
    pub phase_description: String,
    pub test_case_counts: TestCaseCounts,
    /// Retries spent on the current phase's external call
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Non-fatal quality warnings (degraded case count, manual finish)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl BuilderState {
    /// Create the initial `idle` state
    pub fn new(builder_id: BuilderId, problem_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            builder_id,
            problem_name: problem_name.into(),
            phase: BuilderPhase::Idle,
            phase_start_time: now,
            phase_description: BuilderPhase::Idle.default_description().to_string(),
            test_case_counts: TestCaseCounts::default(),
            retry_count: 0,
            error: None,
            error_timestamp: None,
            completed_at: None,
            cancelled_at: None,
            warnings: Vec::new(),
            created_at: now,
        }
    }

    /// Check if the run has reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// When the builder reached its terminal phase, if it has
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.is_terminal().then_some(self.phase_start_time)
    }

    /// Move to the next pipeline phase, resetting the retry counter
    pub fn enter_phase(&mut self, phase: BuilderPhase) -> SpecResult<()> {
        if !self.phase.can_transition_to(phase) {
            return Err(SpecError::InvalidTransition {
                from: self.phase,
                to: phase,
            });
        }
        self.phase = phase;
        self.phase_start_time = Utc::now();
        self.phase_description = phase.default_description().to_string();
        self.retry_count = 0;
        Ok(())
    }

    /// Update the human-readable description without changing phase
    pub fn describe(&mut self, description: impl Into<String>) {
        self.phase_description = description.into();
    }

    /// Record a failed attempt that will be retried
    pub fn record_retry(&mut self, error: impl Into<String>) {
        self.retry_count += 1;
        self.error = Some(error.into());
        self.error_timestamp = Some(Utc::now());
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Terminate as `completed`. Returns false if not legal from here.
    pub fn complete(&mut self, description: impl Into<String>) -> bool {
        if !self.phase.can_transition_to(BuilderPhase::Completed) {
            return false;
        }
        let now = Utc::now();
        self.phase = BuilderPhase::Completed;
        self.phase_start_time = now;
        self.phase_description = description.into();
        self.completed_at = Some(now);
        true
    }

    /// Terminate as `failed` with a captured error
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        let now = Utc::now();
        let error = error.into();
        self.phase = BuilderPhase::Failed;
        self.phase_start_time = now;
        self.phase_description = format!("Build failed: {}", error);
        self.error = Some(error);
        self.error_timestamp = Some(now);
        true
    }

    /// Terminate as `cancelled`. Idempotent: a terminal state is left as is.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        let now = Utc::now();
        self.phase = BuilderPhase::Cancelled;
        self.phase_start_time = now;
        self.phase_description = BuilderPhase::Cancelled.default_description().to_string();
        self.cancelled_at = Some(now);
        true
    }
}
