//! Error types used by the spindle worker facade and task handlers.
//!
//! This module defines two main error enums:
//!
//! - [`WorkerError`] — lifecycle errors raised by worker creation, submission,
//!   and shutdown.
//! - [`TaskError`] — errors raised while resolving or executing an individual
//!   task handler.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.
//!
//! ## Propagation policy
//! Lifecycle errors are local, synchronous, and always reported to the caller
//! of the facade method that produced them. Task-body failures are **fatal to
//! the worker**: they are logged and terminate the execution unit, after which
//! any further `submit`/`close` against that worker reports
//! [`WorkerError::WorkerDead`] instead of hanging.

use thiserror::Error;

/// # Lifecycle errors produced by the worker facade.
///
/// These represent failures of creation, submission, and shutdown — never of
/// task bodies themselves (see [`TaskError`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The requested configuration cannot produce a worker (unsupported
    /// backend kind string, empty name prefix, unusable host command).
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// A submission was attempted after `close()` completed.
    #[error("worker {name} is closed; submissions are rejected")]
    WorkerClosed {
        /// Name of the closed worker.
        name: String,
    },

    /// `close()` was invoked on a worker that is already closed.
    #[error("worker {name} is already closed")]
    AlreadyClosed {
        /// Name of the worker.
        name: String,
    },

    /// The execution unit is no longer alive (a task handler failed or the
    /// unit crashed), so the operation cannot proceed.
    #[error("worker {name} execution unit is dead")]
    WorkerDead {
        /// Name of the dead worker.
        name: String,
    },

    /// A worker with this generated name is already registered.
    #[error("worker name {name} is already registered")]
    NameConflict {
        /// The conflicting name.
        name: String,
    },

    /// A handler with this name is already registered.
    #[error("handler {handler} is already registered")]
    DuplicateHandler {
        /// The conflicting handler name.
        handler: String,
    },

    /// The OS refused to start the execution unit.
    #[error("failed to spawn execution unit: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use spindle::WorkerError;
    ///
    /// let err = WorkerError::AlreadyClosed { name: "w-1".into() };
    /// assert_eq!(err.as_label(), "worker_already_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::InvalidConfiguration { .. } => "worker_invalid_configuration",
            WorkerError::WorkerClosed { .. } => "worker_closed",
            WorkerError::AlreadyClosed { .. } => "worker_already_closed",
            WorkerError::WorkerDead { .. } => "worker_dead",
            WorkerError::NameConflict { .. } => "worker_name_conflict",
            WorkerError::DuplicateHandler { .. } => "worker_duplicate_handler",
            WorkerError::Spawn { .. } => "worker_spawn_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by task resolution and execution.
///
/// These represent failures of individual submitted tasks. Per the worker
/// contract, an execution failure is never propagated back to the submitter;
/// it terminates the worker's execution unit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// No handler is registered under the requested name.
    #[error("handler not found: {handler}")]
    HandlerNotFound {
        /// The unknown handler name.
        handler: String,
    },

    /// The task payload could not be decoded into what the handler expects.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// Why decoding failed.
        reason: String,
    },

    /// The handler ran and reported a failure.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use spindle::TaskError;
    ///
    /// let err = TaskError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::HandlerNotFound { .. } => "task_handler_not_found",
            TaskError::InvalidPayload { .. } => "task_invalid_payload",
            TaskError::Failed { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
