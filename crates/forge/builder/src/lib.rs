//! Forge Builder
//!
//! Orchestrates one exercise from a problem name to a persisted,
//! cross-validated test set.
//!
//! # Architecture
//!
//! ```text
//! BuilderManager ── admission (semaphore) ── Builder::run
//!                                              │
//!   generating_problem   GenerationService + syntax + uniqueness checks
//!   generating_tests     GenerationService + TestCaseExecutor
//!   validating_tests     CrossValidator (primary and secondary solutions)
//!   finalizing           ProblemStore
//! ```
//!
//! Every builder owns its [`BuilderState`](forge_types::BuilderState) and
//! publishes snapshots on a watch channel. Callers steer it through a
//! [`BuilderHandle`]: cancellation and manual finish are flags the
//! orchestrator polls before and after each external call, so an
//! in-flight call is allowed to resolve but its result is discarded.
//!
//! External calls are retried with exponential backoff up to
//! `retry.max_retries` times per phase. A secondary solution identical to
//! the primary gets one free regeneration first; a generator that timed
//! out is rerun once before a new one is requested.

#![deny(unsafe_code)]

mod config;
mod error;
mod handle;
mod limiter;
mod manager;
mod orchestrator;
mod retry;
mod service;
mod store;
mod uniqueness;

pub use config::{
    AdmissionConfig, ForgeConfig, JudgeSettings, LoggingConfig, RateLimitConfig, RetryConfig,
    StorageConfig, ValidationConfig,
};
pub use error::{BuilderError, BuilderResult, GenerationError, StoreError, StoreResult};
pub use handle::{Admission, BuilderControl, BuilderHandle};
pub use limiter::{RateDecision, SlidingWindowLimiter};
pub use manager::{BuilderManager, BuilderSummary};
pub use orchestrator::{cross_validator, Builder, Pipeline};
pub use retry::RetryPolicy;
pub use service::{GenerationCall, GenerationFixture, GenerationService, ScriptedGenerationService};
pub use store::{store_from_config, InMemoryProblemStore, JsonFileProblemStore, ProblemStore, SavedProblem};
pub use uniqueness::{compare_solutions, Sameness};
