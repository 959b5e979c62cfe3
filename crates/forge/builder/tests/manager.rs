//! Admission, rate limiting and lookups through the builder manager

use async_trait::async_trait;
use forge_builder::*;
use forge_types::{BuilderId, BuilderPhase, ProblemSpec, TestCase};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

fn fixture() -> GenerationFixture {
    serde_json::from_str(include_str!("fixtures/two_sum.json")).unwrap()
}

/// Enough canned responses for `runs` builders
fn scripted(runs: usize) -> ScriptedGenerationService {
    let fixture = fixture();
    (0..runs).fold(ScriptedGenerationService::new(), |service, _| {
        service
            .with_problem(Ok(fixture.problem.clone()))
            .with_factory(Ok(fixture.test_factories[0].clone()))
    })
}

fn config(max_concurrent: usize) -> ForgeConfig {
    let mut config = ForgeConfig::for_tests();
    config.admission.max_concurrent_builders = max_concurrent;
    config
}

fn manager(service: Arc<dyn GenerationService>, config: &ForgeConfig) -> BuilderManager {
    let pipeline = Pipeline::new(config, service, Arc::new(InMemoryProblemStore::new()));
    BuilderManager::new(pipeline, config)
}

/// Holds every problem request until released
struct GatedService {
    inner: ScriptedGenerationService,
    entered: mpsc::UnboundedSender<()>,
    release: Notify,
}

#[async_trait]
impl GenerationService for GatedService {
    async fn generate_problem_spec(
        &self,
        problem_name: &str,
        previous_error: Option<&str>,
    ) -> Result<ProblemSpec, GenerationError> {
        let _ = self.entered.send(());
        self.release.notified().await;
        self.inner.generate_problem_spec(problem_name, previous_error).await
    }

    async fn generate_test_factory(
        &self,
        problem: &ProblemSpec,
        existing: &[TestCase],
        previous_error: Option<&str>,
    ) -> Result<String, GenerationError> {
        self.inner
            .generate_test_factory(problem, existing, previous_error)
            .await
    }
}

#[tokio::test]
async fn test_builders_beyond_the_limit_wait_and_can_be_cancelled() {
    let (entered, mut entered_rx) = mpsc::unbounded_channel();
    let service = Arc::new(GatedService {
        inner: scripted(2),
        entered,
        release: Notify::new(),
    });
    let manager = manager(service.clone(), &config(1));

    let first = manager.start("Two Sum").await;
    entered_rx.recv().await.unwrap();
    let second = manager.start("Two Sum").await;
    tokio::task::yield_now().await;

    assert_eq!(first.admission(), Admission::Building);
    assert_eq!(second.admission(), Admission::Pending);
    assert_eq!(second.state().phase, BuilderPhase::Idle);
    assert_eq!(manager.building_count(), 1);

    assert!(manager.cancel(second.id()).await.unwrap());
    let cancelled = second.wait().await;
    assert_eq!(cancelled.phase, BuilderPhase::Cancelled);
    assert_eq!(second.admission(), Admission::Finished);

    service.release.notify_one();
    let completed = first.wait().await;
    assert_eq!(completed.phase, BuilderPhase::Completed, "{completed:?}");

    // the cancelled builder never reached the service
    let problem_calls = service
        .inner
        .calls()
        .iter()
        .filter(|call| call.kind == "problem")
        .count();
    assert_eq!(problem_calls, 1);
    assert!(!manager.cancel(first.id()).await.unwrap());
}

#[tokio::test]
async fn test_queued_builders_all_complete() {
    let manager = manager(Arc::new(scripted(3)), &config(2));
    let mut handles = Vec::new();
    for _ in 0..3 {
        handles.push(manager.start("Two Sum").await);
    }

    let states = join_all(handles.iter().map(|handle| handle.wait())).await;
    assert!(states
        .iter()
        .all(|state| state.phase == BuilderPhase::Completed));

    let listed = manager.list().await;
    assert_eq!(listed.len(), 3);
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
    assert!(listed
        .iter()
        .all(|summary| summary.admission == Admission::Finished));
}

#[tokio::test]
async fn test_start_is_rate_limited_per_subject() {
    let mut config = config(5);
    config.rate_limit.max_requests = 1;
    let manager = manager(Arc::new(scripted(2)), &config);

    manager.start_for("alice", "Two Sum").await.unwrap();
    match manager.start_for("alice", "Two Sum").await {
        Err(BuilderError::RateLimited {
            subject,
            operation,
            retry_after,
        }) => {
            assert_eq!(subject, "alice");
            assert_eq!(operation, "start");
            assert!(retry_after.as_secs() <= config.rate_limit.window_secs);
        }
        other => panic!("expected a rate limit, got {other:?}"),
    }
    manager.start_for("bob", "Two Sum").await.unwrap();
}

#[tokio::test]
async fn test_lookups() {
    let manager = manager(Arc::new(scripted(1)), &config(1));
    let missing = BuilderId::new("missing");
    assert!(matches!(
        manager.state(&missing).await,
        Err(BuilderError::NotFound(_))
    ));
    assert!(matches!(
        manager.cancel(&missing).await,
        Err(BuilderError::NotFound(_))
    ));

    let handle = manager.start("Two Sum").await;
    let updates = manager.subscribe(handle.id()).await.unwrap();
    handle.wait().await;
    assert!(updates.borrow().is_terminal());

    let state = manager.state(handle.id()).await.unwrap();
    assert_eq!(state.phase, BuilderPhase::Completed);
    assert!(matches!(
        manager.finish_manually(handle.id()).await,
        Err(BuilderError::AlreadyTerminal(_, BuilderPhase::Completed))
    ));
}

#[tokio::test]
async fn test_finished_builders_are_pruned_after_retention() {
    let mut config = config(2);
    config.admission.finished_retention_secs = 0;
    config.rate_limit.max_requests = 1;
    config.rate_limit.window_secs = 0;
    let manager = manager(Arc::new(scripted(2)), &config);

    let first = manager.start_for("alice", "Two Sum").await.unwrap();
    first.wait().await;
    assert_eq!(manager.list().await.len(), 1);

    // starting another build forgets the finished one
    let second = manager.start_for("alice", "Two Sum").await.unwrap();
    assert!(matches!(
        manager.state(first.id()).await,
        Err(BuilderError::NotFound(_))
    ));
    second.wait().await;
    assert_eq!(manager.prune_finished().await, 1);
    assert!(manager.list().await.is_empty());
}

#[tokio::test]
async fn test_finished_builders_are_kept_within_retention() {
    let manager = manager(Arc::new(scripted(1)), &config(1));
    let handle = manager.start("Two Sum").await;
    handle.wait().await;
    assert_eq!(manager.prune_finished().await, 0);
    assert_eq!(
        manager.state(handle.id()).await.unwrap().phase,
        BuilderPhase::Completed
    );
}

#[tokio::test]
async fn test_only_finished_builders_can_be_removed() {
    let (entered, mut entered_rx) = mpsc::unbounded_channel();
    let service = Arc::new(GatedService {
        inner: scripted(1),
        entered,
        release: Notify::new(),
    });
    let manager = manager(service.clone(), &config(1));

    let handle = manager.start("Two Sum").await;
    entered_rx.recv().await.unwrap();
    assert!(matches!(
        manager.remove(handle.id()).await,
        Err(BuilderError::StillRunning(_, BuilderPhase::GeneratingProblem))
    ));

    service.release.notify_one();
    handle.wait().await;
    let removed = manager.remove(handle.id()).await.unwrap();
    assert_eq!(removed.phase, BuilderPhase::Completed);
    assert!(matches!(
        manager.remove(handle.id()).await,
        Err(BuilderError::NotFound(_))
    ));
}
