//! Progress state of a ranking run

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Phases of a ranking run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    SelectFirstLevel,
    SelectSecondLevel,
    FetchSecondLevelFollows,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::SelectFirstLevel => "select first level accounts",
            Phase::SelectSecondLevel => "select second level accounts",
            Phase::FetchSecondLevelFollows => "fetch follows of second level accounts",
            Phase::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub phase: Phase,
    pub completed: usize,
    pub total: usize,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            phase: Phase::SelectFirstLevel,
            completed: 0,
            total: 0,
        }
    }
}

impl Status {
    /// Overall progress in percent.
    ///
    /// The two counted phases each cover half of the range; an empty phase
    /// counts as not yet started.
    pub fn percent_complete(&self) -> f64 {
        let fraction = if self.total == 0 {
            0.0
        } else {
            self.completed.min(self.total) as f64 / self.total as f64
        };

        match self.phase {
            Phase::SelectFirstLevel => 0.0,
            Phase::SelectSecondLevel => 50.0 * fraction,
            Phase::FetchSecondLevelFollows => 50.0 + 50.0 * fraction,
            Phase::Completed => 100.0,
        }
    }
}

/// Shared handle to the status of a run.
///
/// The orchestrator is the only writer; any number of pollers may read
/// snapshots concurrently.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<Mutex<Status>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Status> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Status {
        *self.lock()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn percent_complete(&self) -> f64 {
        self.lock().percent_complete()
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    /// Start a fresh run
    pub(crate) fn reset(&self) {
        *self.lock() = Status::default();
    }

    /// Move forward to `phase` and restart the progress counter.
    ///
    /// Returns false, leaving the status untouched, if `phase` is not ahead
    /// of the current phase.
    pub(crate) fn change_phase(&self, phase: Phase, total: usize) -> bool {
        let mut status = self.lock();
        if phase <= status.phase {
            return false;
        }
        *status = Status {
            phase,
            completed: 0,
            total,
        };
        true
    }

    pub(crate) fn fetched(&self) {
        self.lock().completed += 1;
    }
}
