//! # TaskWorker: the single public facade over one execution unit.
//!
//! A [`TaskWorker`] exclusively owns one backend (thread or process) for its
//! entire lifetime. Submissions are fire-and-forget: `submit` enqueues on the
//! backend's private FIFO queue and returns immediately; no result or error
//! from the task body ever comes back to the submitter synchronously.
//!
//! ## Lifecycle
//! ```text
//! spawn(cfg, handlers, registry)
//!   ├─► validate config
//!   ├─► generate unique name (prefix + random 64-bit hex suffix)
//!   ├─► start backend unit (begins in Free, blocked on its queue)
//!   └─► register (name, entry) with the worker registry
//!
//! submit(task) ... submit(task)          (any number of times, FIFO)
//!
//! close()                                (exactly once)
//!   ├─► AlreadyClosed?  → error, does not block
//!   ├─► unit dead?      → reap, error WorkerDead
//!   ├─► enqueue sentinel
//!   ├─► block until unit fully terminated (thread join / process wait)
//!   └─► unregister; facade is now inert (submit → WorkerClosed)
//! ```
//!
//! ## Rules
//! - A facade is **single-use**: once closed it must not be reused.
//! - `close()` has no timeout: a task that never returns blocks it forever.
//! - A worker whose task failed is permanently dead; `submit`/`close` report
//!   [`WorkerError::WorkerDead`] instead of hanging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::{Backend, ProcessBackend, ThreadBackend};
use crate::config::{BackendKind, WorkerConfig};
use crate::error::WorkerError;
use crate::registry::{WorkerEntry, WorkerRegistry};
use crate::state::WorkerState;
use crate::tasks::{HandlerRegistry, Task};

/// Facade owning exactly one background execution unit.
///
/// # Example
/// ```
/// use std::sync::{Arc, mpsc};
/// use serde_json::{json, Value};
/// use spindle::{HandlerRegistry, Task, TaskWorker, WorkerConfig, WorkerRegistry};
///
/// let mut handlers = HandlerRegistry::new();
/// handlers.register_fn("add", |args, _| {
///     Ok(Value::from(args.iter().filter_map(Value::as_i64).sum::<i64>()))
/// })?;
///
/// let registry = WorkerRegistry::arc();
/// let worker = TaskWorker::spawn(WorkerConfig::default(), Arc::new(handlers), registry)?;
///
/// let (tx, rx) = mpsc::channel();
/// worker.submit(
///     Task::new("add")
///         .with_args(vec![json!(2), json!(3)])
///         .on_complete(move |value| { let _ = tx.send(value); }),
/// )?;
///
/// assert_eq!(rx.recv()?, json!(5));
/// worker.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TaskWorker {
    name: String,
    kind: BackendKind,
    backend: Box<dyn Backend>,
    registry: Arc<WorkerRegistry>,
    closed: AtomicBool,
}

impl TaskWorker {
    /// Creates a worker and starts its execution unit immediately.
    ///
    /// The unit begins in [`WorkerState::Free`], blocked on its empty queue.
    /// A unique name is generated from `cfg.name_prefix` plus a random
    /// collision-resistant suffix, and `(name, entry)` is registered with
    /// `registry`.
    ///
    /// For [`BackendKind::Process`], `handlers` is not shipped across the
    /// boundary — the host process must register the same handler names (see
    /// [`run_if_child`](crate::run_if_child)).
    ///
    /// ### Errors
    /// - [`WorkerError::InvalidConfiguration`] — the config cannot produce a
    ///   worker.
    /// - [`WorkerError::Spawn`] — the OS refused to start the unit.
    /// - [`WorkerError::NameConflict`] — the generated name is already
    ///   registered.
    pub fn spawn(
        cfg: WorkerConfig,
        handlers: Arc<HandlerRegistry>,
        registry: Arc<WorkerRegistry>,
    ) -> Result<Self, WorkerError> {
        cfg.validate()?;
        let name = unique_name(&cfg.name_prefix);

        let backend: Box<dyn Backend> = match cfg.kind {
            BackendKind::Thread => Box::new(ThreadBackend::spawn(&name, handlers)?),
            BackendKind::Process => Box::new(ProcessBackend::spawn(&name, &cfg)?),
        };

        registry.register(WorkerEntry::new(name.clone(), cfg.kind, backend.state_cell()))?;
        log::debug!("worker {name} spawned on {} backend", cfg.kind.as_label());

        Ok(Self {
            name,
            kind: cfg.kind,
            backend,
            registry,
            closed: AtomicBool::new(false),
        })
    }

    /// The worker's generated unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which backend the worker runs on.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Current state of the execution unit, as visible to the creator.
    ///
    /// Accurate for both backends: the thread backend shares the cell
    /// directly, the process backend mirrors transitions over its control
    /// pipe.
    pub fn status(&self) -> WorkerState {
        self.backend.state()
    }

    /// Returns `true` while the worker accepts submissions: not closed and
    /// its execution unit still alive.
    pub fn is_running(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.backend.is_alive()
    }

    /// Enqueues a task. Fire-and-forget: returns as soon as the task is on
    /// the private FIFO queue; completion is observable only through the
    /// task's `on_complete` hook.
    ///
    /// ### Errors
    /// - [`WorkerError::WorkerClosed`] — `close()` has completed; submitting
    ///   to a closed worker is rejected, not silently dropped.
    /// - [`WorkerError::WorkerDead`] — the unit crashed on an earlier task.
    pub fn submit(&self, task: Task) -> Result<(), WorkerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(WorkerError::WorkerClosed {
                name: self.name.clone(),
            });
        }
        if !self.backend.is_alive() {
            return Err(WorkerError::WorkerDead {
                name: self.name.clone(),
            });
        }
        log::trace!("worker {} accepted task {}", self.name, task.handler());
        self.backend.enqueue(task)
    }

    /// Requests graceful shutdown and **blocks** until the execution unit has
    /// fully terminated.
    ///
    /// The sentinel travels the same FIFO queue as tasks, so every previously
    /// submitted task completes first. There is no timeout.
    ///
    /// ### Errors
    /// - [`WorkerError::AlreadyClosed`] — second call; returns immediately
    ///   without blocking.
    /// - [`WorkerError::WorkerDead`] — the unit had already crashed; it is
    ///   reaped before returning.
    pub fn close(&self) -> Result<(), WorkerError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(WorkerError::AlreadyClosed {
                name: self.name.clone(),
            });
        }
        if self.backend.state() == WorkerState::Closed {
            self.registry.unregister(&self.name);
            return Err(WorkerError::AlreadyClosed {
                name: self.name.clone(),
            });
        }
        if !self.backend.is_alive() {
            let _ = self.backend.join();
            self.registry.unregister(&self.name);
            return Err(WorkerError::WorkerDead {
                name: self.name.clone(),
            });
        }

        if let Err(err) = self.backend.signal_shutdown() {
            let _ = self.backend.join();
            self.registry.unregister(&self.name);
            return Err(err);
        }
        self.backend.join()?;
        self.registry.unregister(&self.name);
        log::debug!("worker {} closed", self.name);
        Ok(())
    }
}

impl std::fmt::Debug for TaskWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskWorker")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("status", &self.status())
            .finish()
    }
}

/// Generates `prefix-<16 hex digits>` from a random 64-bit value.
fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name("w");
        assert!(name.starts_with("w-"));
        assert_eq!(name.len(), 2 + 16);
    }

    #[test]
    fn test_unique_names_differ_for_same_prefix() {
        assert_ne!(unique_name("worker"), unique_name("worker"));
    }
}
