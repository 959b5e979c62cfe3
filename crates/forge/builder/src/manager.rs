//! Builder manager: admission queue and caller-facing operations
//!
//! At most `max_concurrent_builders` builders run at once. Later starts
//! are admitted in order as slots free up; until then they report
//! `pending`. A builder cancelled while pending ends as `cancelled`
//! without touching any collaborator.
//!
//! Finished builders stay queryable for `finished_retention_secs`, after
//! which the next start (or an explicit `prune_finished`) forgets them.

use crate::config::ForgeConfig;
use crate::error::{BuilderError, BuilderResult};
use crate::handle::{Admission, BuilderHandle};
use crate::limiter::{RateDecision, SlidingWindowLimiter};
use crate::orchestrator::{Builder, Pipeline};
use chrono::{DateTime, Utc};
use forge_types::{BuilderId, BuilderPhase, BuilderState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock, Semaphore};
use tracing::{debug, info};

/// Listing entry for one builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderSummary {
    pub builder_id: BuilderId,
    pub problem_name: String,
    pub phase: BuilderPhase,
    pub admission: Admission,
    pub created_at: DateTime<Utc>,
}

pub struct BuilderManager {
    pipeline: Pipeline,
    admission: Arc<Semaphore>,
    max_concurrent: usize,
    retention: Duration,
    limiter: SlidingWindowLimiter,
    builders: RwLock<HashMap<BuilderId, BuilderHandle>>,
}

impl BuilderManager {
    pub fn new(pipeline: Pipeline, config: &ForgeConfig) -> Self {
        let max_concurrent = config.admission.max_concurrent_builders.max(1);
        Self {
            pipeline,
            admission: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            retention: config.admission.finished_retention(),
            limiter: SlidingWindowLimiter::from_config(&config.rate_limit),
            builders: RwLock::new(HashMap::new()),
        }
    }

    /// Start a builder for `problem_name`
    pub async fn start(&self, problem_name: impl Into<String>) -> BuilderHandle {
        self.prune_finished().await;
        let (builder, handle) = Builder::new(self.pipeline.clone(), problem_name);
        let id = builder.id().clone();
        self.builders.write().await.insert(id.clone(), handle.clone());

        let admission = self.admission.clone();
        let control = handle.control().clone();
        debug!(builder_id = %id, available = admission.available_permits(), "Builder queued");
        tokio::spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = control.cancelled() => None,
                permit = admission.acquire_owned() => permit.ok(),
            };
            match permit {
                Some(_permit) => {
                    control.admit();
                    builder.run().await;
                }
                // cancelled while pending
                None => {
                    builder.abandon();
                }
            }
        });

        info!(builder_id = %id, "Builder started");
        handle
    }

    /// Start a builder on behalf of `subject`, subject to rate limiting
    pub async fn start_for(
        &self,
        subject: &str,
        problem_name: impl Into<String>,
    ) -> BuilderResult<BuilderHandle> {
        match self.limiter.try_acquire(subject, "start").await {
            RateDecision::Allowed { .. } => Ok(self.start(problem_name).await),
            RateDecision::Limited { retry_after } => Err(BuilderError::RateLimited {
                subject: subject.to_string(),
                operation: "start".into(),
                retry_after,
            }),
        }
    }

    pub async fn handle(&self, id: &BuilderId) -> BuilderResult<BuilderHandle> {
        self.builders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BuilderError::NotFound(id.clone()))
    }

    /// Request cancellation. Returns false if the builder already ended.
    pub async fn cancel(&self, id: &BuilderId) -> BuilderResult<bool> {
        Ok(self.handle(id).await?.cancel())
    }

    pub async fn finish_manually(&self, id: &BuilderId) -> BuilderResult<()> {
        self.handle(id).await?.finish_manually()
    }

    pub async fn state(&self, id: &BuilderId) -> BuilderResult<BuilderState> {
        Ok(self.handle(id).await?.state())
    }

    pub async fn subscribe(&self, id: &BuilderId) -> BuilderResult<watch::Receiver<BuilderState>> {
        Ok(self.handle(id).await?.subscribe())
    }

    /// Forget a finished builder, returning its final state
    pub async fn remove(&self, id: &BuilderId) -> BuilderResult<BuilderState> {
        let mut builders = self.builders.write().await;
        let state = builders
            .get(id)
            .map(|handle| handle.state())
            .ok_or_else(|| BuilderError::NotFound(id.clone()))?;
        if !state.is_terminal() {
            return Err(BuilderError::StillRunning(id.clone(), state.phase));
        }
        builders.remove(id);
        debug!(builder_id = %id, "Builder removed");
        Ok(state)
    }

    /// Forget builders that finished longer ago than the retention period,
    /// and rate-limit keys with nothing left in their window. Returns how
    /// many builders were dropped.
    pub async fn prune_finished(&self) -> usize {
        let cutoff = chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention));
        let pruned = match cutoff {
            Some(cutoff) => {
                let mut builders = self.builders.write().await;
                let before = builders.len();
                builders.retain(|_, handle| {
                    handle
                        .state()
                        .finished_at()
                        .map_or(true, |finished| finished > cutoff)
                });
                before - builders.len()
            }
            None => 0,
        };
        let keys = self.limiter.prune_idle().await;
        if pruned > 0 || keys > 0 {
            debug!(builders = pruned, rate_limit_keys = keys, "Pruned idle entries");
        }
        pruned
    }

    /// All builders, oldest first
    pub async fn list(&self) -> Vec<BuilderSummary> {
        let builders = self.builders.read().await;
        let mut summaries: Vec<BuilderSummary> = builders
            .values()
            .map(|handle| {
                let state = handle.state();
                BuilderSummary {
                    builder_id: state.builder_id,
                    problem_name: state.problem_name,
                    phase: state.phase,
                    admission: handle.admission(),
                    created_at: state.created_at,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    /// Builders currently holding an admission slot
    pub fn building_count(&self) -> usize {
        self.max_concurrent - self.admission.available_permits()
    }
}
