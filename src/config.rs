//! # Worker creation configuration.
//!
//! [`WorkerConfig`] defines everything a [`TaskWorker`](crate::TaskWorker)
//! needs at creation time: which backend to use, the name prefix for the
//! generated unique worker name, and (for the process backend) which host
//! command to launch.
//!
//! # Example
//! ```
//! use spindle::{BackendKind, WorkerConfig};
//!
//! let mut cfg = WorkerConfig::default();
//! cfg.kind = BackendKind::Thread;
//! cfg.name_prefix = "resize".into();
//!
//! assert_eq!(cfg.kind, BackendKind::Thread);
//! assert!(cfg.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// The OS primitive backing a worker's execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// A dedicated OS thread sharing the creator's address space.
    Thread,
    /// A dedicated OS process communicating over pipes.
    Process,
}

impl BackendKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackendKind::Thread => "thread",
            BackendKind::Process => "process",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for BackendKind {
    type Err = WorkerError;

    /// Parses a backend kind from its string form.
    ///
    /// Any value other than `"thread"` or `"process"` fails with
    /// [`WorkerError::InvalidConfiguration`].
    ///
    /// # Example
    /// ```
    /// use spindle::BackendKind;
    ///
    /// assert_eq!("thread".parse::<BackendKind>().unwrap(), BackendKind::Thread);
    /// assert!("coroutine".parse::<BackendKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thread" => Ok(BackendKind::Thread),
            "process" => Ok(BackendKind::Process),
            other => Err(WorkerError::InvalidConfiguration {
                reason: format!("unsupported backend kind: {other:?}"),
            }),
        }
    }
}

/// Configuration for creating one [`TaskWorker`](crate::TaskWorker).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Which execution unit backs the worker.
    pub kind: BackendKind,
    /// Prefix of the generated unique worker name.
    pub name_prefix: String,
    /// Process backend only: the host executable to launch. `None` launches
    /// the current executable, which must call
    /// [`run_if_child`](crate::run_if_child) early in `main`.
    pub host_command: Option<PathBuf>,
    /// Process backend only: extra arguments passed to the host command.
    pub host_args: Vec<String>,
}

impl Default for WorkerConfig {
    /// Provides a default configuration:
    /// - `kind = BackendKind::Thread`
    /// - `name_prefix = "worker"`
    /// - `host_command = None` (current executable)
    /// - `host_args = []`
    fn default() -> Self {
        Self {
            kind: BackendKind::Thread,
            name_prefix: "worker".to_string(),
            host_command: None,
            host_args: Vec::new(),
        }
    }
}

impl WorkerConfig {
    /// Creates a configuration for the given backend kind and name prefix.
    pub fn new(kind: BackendKind, name_prefix: impl Into<String>) -> Self {
        Self {
            kind,
            name_prefix: name_prefix.into(),
            ..Self::default()
        }
    }

    /// Checks the configuration for values that cannot produce a worker.
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.name_prefix.is_empty() {
            return Err(WorkerError::InvalidConfiguration {
                reason: "name_prefix must not be empty".to_string(),
            });
        }
        if let Some(cmd) = &self.host_command {
            if cmd.as_os_str().is_empty() {
                return Err(WorkerError::InvalidConfiguration {
                    reason: "host_command must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
