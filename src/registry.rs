//! # Worker registry: process-wide enumeration of live workers.
//!
//! [`WorkerRegistry`] maps generated worker names to lightweight
//! [`WorkerEntry`] records. Every [`TaskWorker`](crate::TaskWorker) registers
//! itself at creation time and unregisters when `close()` completes.
//!
//! The registry is an explicit, injectable object rather than global state:
//! create one per process (typically wrapped in an `Arc` shared with every
//! worker creation site), never reset it implicitly, and pass a separate
//! instance in tests that need isolation.
//!
//! ## Rules
//! - Entries do **not** own the worker; the caller does. An entry carries the
//!   backend kind and a live view of the worker's state, which is enough for
//!   enumeration and lifecycle tracking.
//! - `list()` and `states()` return name-sorted snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::BackendKind;
use crate::error::WorkerError;
use crate::state::{StateCell, WorkerState};

/// Registry record for one live worker.
#[derive(Debug, Clone)]
pub struct WorkerEntry {
    name: String,
    kind: BackendKind,
    state: Arc<StateCell>,
}

impl WorkerEntry {
    pub(crate) fn new(name: String, kind: BackendKind, state: Arc<StateCell>) -> Self {
        Self { name, kind, state }
    }

    /// The worker's generated unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which backend the worker runs on.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The worker's current state, as visible to its creator.
    pub fn state(&self) -> WorkerState {
        self.state.load()
    }
}

/// Process-wide collection mapping generated names to live worker entries.
#[derive(Default)]
pub struct WorkerRegistry {
    inner: Mutex<HashMap<String, WorkerEntry>>,
}

impl WorkerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry behind a shared handle.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers a worker entry under its generated name.
    ///
    /// Fails with [`WorkerError::NameConflict`] if the name is taken — the
    /// random suffix makes this vanishingly unlikely, but a collision must
    /// surface rather than overwrite.
    pub(crate) fn register(&self, entry: WorkerEntry) -> Result<(), WorkerError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.contains_key(entry.name()) {
            return Err(WorkerError::NameConflict {
                name: entry.name().to_string(),
            });
        }
        inner.insert(entry.name().to_string(), entry);
        Ok(())
    }

    /// Removes a worker entry; returns it if it was present.
    pub(crate) fn unregister(&self, name: &str) -> Option<WorkerEntry> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
    }

    /// Returns the sorted list of registered worker names.
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = inner.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the entry registered under `name`, if any.
    ///
    /// The entry is a cheap clone sharing the worker's live state cell, so a
    /// held entry keeps reporting the current state.
    pub fn get(&self, name: &str) -> Option<WorkerEntry> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Returns `true` if a worker is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Returns a name-sorted snapshot of every worker's current state.
    pub fn states(&self) -> Vec<(String, WorkerState)> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut states: Vec<(String, WorkerState)> = inner
            .values()
            .map(|entry| (entry.name().to_string(), entry.state()))
            .collect();
        states.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if no workers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &self.list())
            .finish()
    }
}
