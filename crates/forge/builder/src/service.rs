//! The generation service collaborator

use crate::error::GenerationError;
use async_trait::async_trait;
use forge_types::{ProblemSpec, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Produces problem specs and test factories (a language-model backed
/// service in production)
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a full problem spec for `problem_name`. `previous_error`
    /// explains why the last attempt was rejected.
    async fn generate_problem_spec(
        &self,
        problem_name: &str,
        previous_error: Option<&str>,
    ) -> Result<ProblemSpec, GenerationError>;

    /// Generate a test factory source for `problem`
    async fn generate_test_factory(
        &self,
        problem: &ProblemSpec,
        existing: &[TestCase],
        previous_error: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// A recorded call to a scripted service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub kind: &'static str,
    pub previous_error: Option<String>,
}

/// Replays canned responses in order, for tests and fixture replay
#[derive(Debug, Default)]
pub struct ScriptedGenerationService {
    problems: Mutex<VecDeque<Result<ProblemSpec, GenerationError>>>,
    factories: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<GenerationCall>>,
}

/// A replay fixture: `{"problem": {..}, "testFactories": ["..", ..]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFixture {
    pub problem: ProblemSpec,
    pub test_factories: Vec<String>,
}

impl ScriptedGenerationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: GenerationFixture) -> Self {
        let service = Self::new().with_problem(Ok(fixture.problem));
        fixture
            .test_factories
            .into_iter()
            .fold(service, |service, source| service.with_factory(Ok(source)))
    }

    pub fn with_problem(self, response: Result<ProblemSpec, GenerationError>) -> Self {
        lock(&self.problems).push_back(response);
        self
    }

    pub fn with_factory(self, response: Result<String, GenerationError>) -> Self {
        lock(&self.factories).push_back(response);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<GenerationCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, kind: &'static str, previous_error: Option<&str>) {
        lock(&self.calls).push(GenerationCall {
            kind,
            previous_error: previous_error.map(str::to_string),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl GenerationService for ScriptedGenerationService {
    async fn generate_problem_spec(
        &self,
        _problem_name: &str,
        previous_error: Option<&str>,
    ) -> Result<ProblemSpec, GenerationError> {
        self.record("problem", previous_error);
        lock(&self.problems)
            .pop_front()
            .unwrap_or(Err(GenerationError::Exhausted("problem")))
    }

    async fn generate_test_factory(
        &self,
        _problem: &ProblemSpec,
        _existing: &[TestCase],
        previous_error: Option<&str>,
    ) -> Result<String, GenerationError> {
        self.record("test factory", previous_error);
        lock(&self.factories)
            .pop_front()
            .unwrap_or(Err(GenerationError::Exhausted("test factory")))
    }
}
