//! Observing and steering a running builder

use crate::error::{BuilderError, BuilderResult};
use forge_types::{BuilderId, BuilderPhase, BuilderState};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// Requests from callers to a builder, polled at suspension points
#[derive(Debug, Default)]
pub struct BuilderControl {
    cancelled: AtomicBool,
    finish_requested: AtomicBool,
    admitted: AtomicBool,
    notify: Notify,
}

impl BuilderControl {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn request_finish(&self) {
        self.finish_requested.store(true, Ordering::SeqCst);
    }

    pub fn finish_requested(&self) -> bool {
        self.finish_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn admit(&self) {
        self.admitted.store(true, Ordering::SeqCst);
    }

    pub fn is_admitted(&self) -> bool {
        self.admitted.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Where a builder stands with respect to admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    /// Waiting for a free slot
    Pending,
    /// Holding a slot
    Building,
    /// Reached a terminal phase
    Finished,
}

/// A cloneable handle on one builder
#[derive(Debug, Clone)]
pub struct BuilderHandle {
    id: BuilderId,
    control: Arc<BuilderControl>,
    state_rx: watch::Receiver<BuilderState>,
}

impl BuilderHandle {
    pub(crate) fn new(
        id: BuilderId,
        control: Arc<BuilderControl>,
        state_rx: watch::Receiver<BuilderState>,
    ) -> Self {
        Self {
            id,
            control,
            state_rx,
        }
    }

    pub fn id(&self) -> &BuilderId {
        &self.id
    }

    pub(crate) fn control(&self) -> &Arc<BuilderControl> {
        &self.control
    }

    /// Snapshot of the current state
    pub fn state(&self) -> BuilderState {
        self.state_rx.borrow().clone()
    }

    /// A receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<BuilderState> {
        self.state_rx.clone()
    }

    pub fn admission(&self) -> Admission {
        if self.state_rx.borrow().is_terminal() {
            Admission::Finished
        } else if self.control.is_admitted() {
            Admission::Building
        } else {
            Admission::Pending
        }
    }

    /// Request cancellation. Returns false if the run already ended.
    pub fn cancel(&self) -> bool {
        if self.state_rx.borrow().is_terminal() {
            return false;
        }
        self.control.cancel();
        true
    }

    /// Skip remaining validation and persist what has passed so far.
    ///
    /// Needs a problem spec and at least one generated test case.
    pub fn finish_manually(&self) -> BuilderResult<()> {
        let state = self.state();
        if state.is_terminal() {
            return Err(BuilderError::AlreadyTerminal(self.id.clone(), state.phase));
        }
        let generated = state.test_case_counts.generated;
        if matches!(state.phase, BuilderPhase::Idle | BuilderPhase::GeneratingProblem) || generated == 0 {
            return Err(BuilderError::NotReadyForManualFinish {
                id: self.id.clone(),
                phase: state.phase,
                generated,
            });
        }
        self.control.request_finish();
        Ok(())
    }

    /// Wait for a terminal phase and return the final state
    pub async fn wait(&self) -> BuilderState {
        let mut rx = self.state_rx.clone();
        loop {
            if rx.borrow_and_update().is_terminal() {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        let state = rx.borrow().clone();
        state
    }
}
