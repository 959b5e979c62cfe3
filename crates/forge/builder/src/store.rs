//! Persistence of finished problems

use crate::config::StorageConfig;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forge_types::{ProblemSpec, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A persisted problem with its validated test cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProblem {
    pub problem: ProblemSpec,
    pub test_cases: Vec<TestCase>,
    pub saved_at: DateTime<Utc>,
}

/// Storage for finished problems
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Save a problem and its test cases, replacing any earlier version
    async fn save_problem(&self, problem: &ProblemSpec, test_cases: &[TestCase]) -> StoreResult<()>;

    /// Get a problem by slug
    async fn get_problem(&self, slug: &str) -> StoreResult<Option<SavedProblem>>;

    /// List saved problem slugs
    async fn list_problems(&self) -> StoreResult<Vec<String>>;
}

/// Build the store selected by configuration
pub fn store_from_config(config: &StorageConfig) -> Arc<dyn ProblemStore> {
    match config {
        StorageConfig::Memory => Arc::new(InMemoryProblemStore::new()),
        StorageConfig::Json { dir } => Arc::new(JsonFileProblemStore::new(dir.clone())),
    }
}

fn saved(problem: &ProblemSpec, test_cases: &[TestCase]) -> StoreResult<SavedProblem> {
    if problem.slug.is_empty() {
        return Err(StoreError::Rejected("problem has no slug".into()));
    }
    Ok(SavedProblem {
        problem: problem.clone(),
        test_cases: test_cases.to_vec(),
        saved_at: Utc::now(),
    })
}

// ── In-Memory ────────────────────────────────────────────────────────

/// In-memory storage for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryProblemStore {
    problems: Arc<RwLock<HashMap<String, SavedProblem>>>,
}

impl InMemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProblemStore for InMemoryProblemStore {
    async fn save_problem(&self, problem: &ProblemSpec, test_cases: &[TestCase]) -> StoreResult<()> {
        let record = saved(problem, test_cases)?;
        let mut problems = self.problems.write().await;
        problems.insert(record.problem.slug.clone(), record);
        Ok(())
    }

    async fn get_problem(&self, slug: &str) -> StoreResult<Option<SavedProblem>> {
        let problems = self.problems.read().await;
        Ok(problems.get(slug).cloned())
    }

    async fn list_problems(&self) -> StoreResult<Vec<String>> {
        let problems = self.problems.read().await;
        let mut slugs: Vec<String> = problems.keys().cloned().collect();
        slugs.sort();
        Ok(slugs)
    }
}

// ── JSON Files ───────────────────────────────────────────────────────

/// One `<slug>.json` document per problem
#[derive(Debug, Clone)]
pub struct JsonFileProblemStore {
    dir: PathBuf,
}

impl JsonFileProblemStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, slug: &str) -> StoreResult<PathBuf> {
        if slug.is_empty() || slug.contains(['/', '\\']) || slug.starts_with('.') {
            return Err(StoreError::Rejected(format!("unsafe slug: {slug:?}")));
        }
        Ok(self.dir.join(format!("{slug}.json")))
    }

    /// Read a problem file written by this store
    pub async fn read_file(path: impl Into<PathBuf>) -> StoreResult<SavedProblem> {
        let bytes = tokio::fs::read(path.into()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ProblemStore for JsonFileProblemStore {
    async fn save_problem(&self, problem: &ProblemSpec, test_cases: &[TestCase]) -> StoreResult<()> {
        let record = saved(problem, test_cases)?;
        let path = self.path_for(&record.problem.slug)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&record)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        info!(path = %path.display(), cases = test_cases.len(), "Saved problem");
        Ok(())
    }

    async fn get_problem(&self, slug: &str) -> StoreResult<Option<SavedProblem>> {
        let path = self.path_for(slug)?;
        match tokio::fs::try_exists(&path).await? {
            true => Ok(Some(Self::read_file(path).await?)),
            false => Ok(None),
        }
    }

    async fn list_problems(&self) -> StoreResult<Vec<String>> {
        let mut slugs = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(slugs),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    slugs.push(stem.to_string());
                }
            }
        }
        slugs.sort();
        Ok(slugs)
    }
}
