//! # Thread-backed execution unit.
//!
//! Runs the shared worker loop on one dedicated OS thread. The private queue
//! is an unbounded `std::sync::mpsc` channel: `enqueue` never blocks the
//! caller, and the worker thread blocks on `recv()` — the loop's only
//! suspension point.
//!
//! The thread shares the creator's address space, so the [`StateCell`] is
//! directly visible to the facade — no mirroring needed. Rust threads never
//! keep the process alive on their own, which gives the background/daemon
//! behavior the worker contract requires.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::backend::{drive, Backend};
use crate::error::WorkerError;
use crate::state::{StateCell, WorkerState};
use crate::tasks::{Envelope, HandlerRegistry, Task};

/// Dedicated-thread backend for one worker.
pub(crate) struct ThreadBackend {
    name: String,
    tx: Sender<Envelope>,
    state: Arc<StateCell>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadBackend {
    /// Spawns the worker thread; it immediately blocks waiting for work.
    pub(crate) fn spawn(
        name: &str,
        handlers: Arc<HandlerRegistry>,
    ) -> Result<Self, WorkerError> {
        let (tx, rx) = mpsc::channel::<Envelope>();
        let state = Arc::new(StateCell::new());
        let cell = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                drive(
                    cell.as_ref(),
                    || match rx.recv() {
                        Ok(Envelope::Run(task)) => Some(task),
                        // A dropped sender is treated like the sentinel.
                        Ok(Envelope::Shutdown) | Err(_) => None,
                    },
                    |task: Task| {
                        let Task {
                            handler,
                            args,
                            kwargs,
                            hook,
                        } = task;
                        let value =
                            handlers.invoke(&handler, args.as_deref(), kwargs.as_ref())?;
                        if let Some(hook) = hook {
                            hook(value);
                        }
                        Ok(())
                    },
                );
            })
            .map_err(|source| WorkerError::Spawn { source })?;

        Ok(Self {
            name: name.to_string(),
            tx,
            state,
            handle: Mutex::new(Some(handle)),
        })
    }

    fn dead(&self) -> WorkerError {
        WorkerError::WorkerDead {
            name: self.name.clone(),
        }
    }
}

impl Backend for ThreadBackend {
    fn enqueue(&self, task: Task) -> Result<(), WorkerError> {
        self.tx
            .send(Envelope::Run(task))
            .map_err(|_| self.dead())
    }

    fn signal_shutdown(&self) -> Result<(), WorkerError> {
        self.tx.send(Envelope::Shutdown).map_err(|_| self.dead())
    }

    fn state(&self) -> WorkerState {
        self.state.load()
    }

    fn state_cell(&self) -> Arc<StateCell> {
        Arc::clone(&self.state)
    }

    fn is_alive(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn join(&self) -> Result<(), WorkerError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match handle {
            Some(h) => h.join().map_err(|_| self.dead()),
            None => Ok(()),
        }
    }
}
