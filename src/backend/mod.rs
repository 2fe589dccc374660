//! # Execution backends: the loop contract and its two implementations.
//!
//! A worker's execution unit — OS thread or OS process — runs the same loop:
//!
//! ```text
//! loop {
//!   ├─► block on the private FIFO queue            (only suspension point)
//!   ├─► sentinel?        → transition Closed, return (unit terminates)
//!   ├─► transition Pending
//!   ├─► invoke the task's handler with its args
//!   │     └─ Err/panic   → fatal: log, return      (unit dies, no Closed)
//!   ├─► completion hook with the return value (if any)
//!   └─► transition Free, repeat
//! }
//! ```
//!
//! The loop is written **once**, in [`drive`], and parameterized over the
//! dequeue operation, the execution step, and a [`StateSink`]. The thread
//! backend sinks transitions straight into the shared [`StateCell`]; the
//! process host additionally mirrors each transition onto its control pipe so
//! the parent's cell stays accurate across the process boundary.
//!
//! ## Rules
//! - Tasks are processed strictly in submission (FIFO) order.
//! - The sentinel travels the same queue, so shutdown is graceful: it is
//!   processed only after every previously submitted task completed.
//! - A failed handler is fatal to the unit. The unit exits **without**
//!   reaching `Closed`; the facade detects the dead unit and reports
//!   [`WorkerDead`](crate::WorkerError::WorkerDead) on later calls.

pub(crate) mod host;
mod process;
mod thread;

pub(crate) use process::ProcessBackend;
pub(crate) use thread::ThreadBackend;

use std::sync::Arc;

use crate::error::{TaskError, WorkerError};
use crate::state::{StateCell, WorkerState};
use crate::tasks::Task;

/// Receives the loop's state transitions.
///
/// The thread backend's sink is the shared cell itself; the process host's
/// sink also writes a `State` frame to the control pipe per transition.
pub(crate) trait StateSink {
    fn transition(&self, state: WorkerState);
}

impl StateSink for StateCell {
    fn transition(&self, state: WorkerState) {
        self.store(state);
    }
}

/// Runs the shared worker loop until the sentinel arrives or a task fails.
///
/// - `dequeue` blocks for the next item; `None` means the sentinel (or a
///   closed queue, which is treated the same way).
/// - `execute` runs one task; an `Err` is fatal and terminates the loop with
///   the state left as-is (deliberately not `Closed`).
pub(crate) fn drive<T>(
    sink: &dyn StateSink,
    mut dequeue: impl FnMut() -> Option<T>,
    mut execute: impl FnMut(T) -> Result<(), TaskError>,
) {
    loop {
        let Some(item) = dequeue() else {
            sink.transition(WorkerState::Closed);
            return;
        };

        sink.transition(WorkerState::Pending);
        if let Err(err) = execute(item) {
            log::error!("task execution fatal to worker: {}", err.as_message());
            return;
        }
        sink.transition(WorkerState::Free);
    }
}

/// One worker's execution backend, owned exclusively by the facade.
pub(crate) trait Backend: Send + Sync {
    /// Enqueues a task on the private FIFO queue. Never blocks.
    fn enqueue(&self, task: Task) -> Result<(), WorkerError>;

    /// Enqueues the shutdown sentinel. Never blocks.
    fn signal_shutdown(&self) -> Result<(), WorkerError>;

    /// Returns the creator-visible state of the execution unit.
    fn state(&self) -> WorkerState;

    /// Returns a shared handle to the state cell (for registry entries).
    fn state_cell(&self) -> Arc<StateCell>;

    /// Returns `true` while the execution unit is running.
    fn is_alive(&self) -> bool;

    /// Blocks until the execution unit has fully terminated and its OS
    /// resources are released. Idempotent: later calls return immediately.
    fn join(&self) -> Result<(), WorkerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<WorkerState>>);

    impl StateSink for RecordingSink {
        fn transition(&self, state: WorkerState) {
            self.0.lock().unwrap().push(state);
        }
    }

    #[test]
    fn test_sentinel_only_transitions_to_closed() {
        let sink = RecordingSink(Mutex::new(Vec::new()));
        drive::<()>(&sink, || None, |_| Ok(()));
        assert_eq!(*sink.0.lock().unwrap(), vec![WorkerState::Closed]);
    }

    #[test]
    fn test_items_then_sentinel() {
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let mut queue = vec![Some(1), Some(2), None].into_iter();
        let mut seen = Vec::new();
        drive(
            &sink,
            || queue.next().flatten(),
            |n| {
                seen.push(n);
                Ok(())
            },
        );
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![
                WorkerState::Pending,
                WorkerState::Free,
                WorkerState::Pending,
                WorkerState::Free,
                WorkerState::Closed,
            ]
        );
    }

    #[test]
    fn test_fatal_execution_stops_loop_before_closed() {
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let mut queue = vec![Some(1), Some(2), None].into_iter();
        drive(
            &sink,
            || queue.next().flatten(),
            |_| {
                Err(TaskError::Failed {
                    error: "boom".into(),
                })
            },
        );
        // Dies on the first item: Pending recorded, never Free, never Closed.
        assert_eq!(*sink.0.lock().unwrap(), vec![WorkerState::Pending]);
    }
}
