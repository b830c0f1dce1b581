//! State shared between the ingestion worker and query callers.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use novatel_core::FusionState;

/// Lifecycle of the ingestion worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Never started.
    Idle,
    Connecting,
    Streaming,
    /// Exited; see [`WorkerExit`] for why. Not restarted automatically.
    Stopped,
}

impl WorkerState {
    pub fn is_active(self) -> bool {
        matches!(self, WorkerState::Connecting | WorkerState::Streaming)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Connecting => write!(f, "connecting"),
            WorkerState::Streaming => write!(f, "streaming"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a worker run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// `stop()` was requested.
    Cancelled,
    /// The receiver closed the connection.
    RemoteClosed,
    /// Connect failure or socket fault.
    Failed(String),
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Cancelled => write!(f, "cancelled"),
            WorkerExit::RemoteClosed => write!(f, "remote closed the connection"),
            WorkerExit::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug)]
struct WorkerStatus {
    state: WorkerState,
    last_exit: Option<WorkerExit>,
}

/// Fusion state behind the single data lock, plus worker status.
#[derive(Debug)]
pub(crate) struct Shared {
    fusion: Mutex<FusionState>,
    status: Mutex<WorkerStatus>,
}

impl Shared {
    pub(crate) fn new(fusion: FusionState) -> Self {
        Shared {
            fusion: Mutex::new(fusion),
            status: Mutex::new(WorkerStatus {
                state: WorkerState::Idle,
                last_exit: None,
            }),
        }
    }

    /// Lock the fusion state.
    ///
    /// Every mutation leaves the state consistent, so a poisoned lock is
    /// recovered rather than propagated.
    pub(crate) fn fusion(&self) -> MutexGuard<'_, FusionState> {
        self.fusion.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn status(&self) -> MutexGuard<'_, WorkerStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.status().state
    }

    pub(crate) fn last_exit(&self) -> Option<WorkerExit> {
        self.status().last_exit.clone()
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.status().state = state;
    }

    /// Mark a new run as connecting and forget the previous exit.
    pub(crate) fn begin(&self) {
        let mut status = self.status();
        status.state = WorkerState::Connecting;
        status.last_exit = None;
    }

    pub(crate) fn finish(&self, exit: WorkerExit) {
        let mut status = self.status();
        status.state = WorkerState::Stopped;
        status.last_exit = Some(exit);
    }
}
