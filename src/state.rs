//! # Worker execution state.
//!
//! [`WorkerState`] is the small state machine every worker's execution unit
//! moves through:
//!
//! ```text
//! Free ──(item dequeued)──► Pending ──(execution finished)──► Free
//!   │                                                           │
//!   └──────────────(sentinel dequeued)──► Closed ◄──────────────┘
//! ```
//!
//! `Closed` is terminal: a unit that reached it will process no further items.
//!
//! [`StateCell`] makes the current state observable from the creator. For a
//! thread-backed worker the cell is shared memory; for a process-backed worker
//! the child cannot share memory with its parent, so the child mirrors every
//! transition onto its control pipe and a parent-side reader applies it to the
//! parent's cell. Either way, `StateCell::load` is always the creator's view.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Execution state of a worker's backing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Idle, blocked on the private queue awaiting the next item. Initial state.
    Free,
    /// An item has been dequeued and its handler is currently executing.
    Pending,
    /// The shutdown sentinel was received; the unit is exiting. Terminal state.
    Closed,
}

impl WorkerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use spindle::WorkerState;
    ///
    /// assert_eq!(WorkerState::Pending.as_label(), "pending");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerState::Free => "free",
            WorkerState::Pending => "pending",
            WorkerState::Closed => "closed",
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Free => 0,
            WorkerState::Pending => 1,
            WorkerState::Closed => 2,
        }
    }

    fn from_u8(raw: u8) -> WorkerState {
        match raw {
            0 => WorkerState::Free,
            1 => WorkerState::Pending,
            _ => WorkerState::Closed,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Lock-free cell holding a worker's current [`WorkerState`].
///
/// One cell exists per worker, created together with the backend and shared
/// (via `Arc`) with the facade and the worker registry.
///
/// ### Rules
/// - The execution unit (or, for the process backend, the control-pipe
///   reader) is the **only writer** during normal operation.
/// - Any holder may `load()` at any time; reads never block.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    /// Creates a cell in the initial [`WorkerState::Free`] state.
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Free.as_u8()))
    }

    /// Records a state transition.
    pub(crate) fn store(&self, state: WorkerState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Returns the most recently recorded state.
    pub(crate) fn load(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_starts_free() {
        let cell = StateCell::new();
        assert_eq!(cell.load(), WorkerState::Free);
    }

    #[test]
    fn test_cell_roundtrips_every_state() {
        let cell = StateCell::new();
        for state in [WorkerState::Pending, WorkerState::Free, WorkerState::Closed] {
            cell.store(state);
            assert_eq!(cell.load(), state);
        }
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(WorkerState::Free.as_label(), "free");
        assert_eq!(WorkerState::Closed.to_string(), "closed");
    }
}
