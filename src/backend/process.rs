//! # Process-backed execution unit.
//!
//! Runs the worker loop in a dedicated OS process (see
//! [`host`](crate::backend::host) for the child side and the wire protocol).
//! The child's stdin is the private FIFO queue; its stdout is the control
//! pipe.
//!
//! Two parent-side threads bridge the pipes:
//!
//! - A **writer thread** drains an unbounded staging channel into the child's
//!   stdin. The pipe itself is a small OS buffer that fills while the child is
//!   busy, so `enqueue` never writes it directly — it only performs a channel
//!   send and returns, keeping `submit` non-blocking no matter the backlog.
//! - A **reader thread** consumes the control pipe: it applies `State` frames
//!   to the shared [`StateCell`] (accurate `status()`), dispatches `Done`
//!   frames to the completion hooks retained at submit time (hooks are
//!   closures and never cross the process boundary), and marks the worker
//!   dead on a `Fault` frame or an unexpected exit.
//!
//! Completion hooks therefore run on the reader thread, in submission order —
//! the child executes FIFO and both pipes preserve frame order.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::backend::host::{HostReply, HostRequest, HOST_ENV};
use crate::backend::Backend;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::state::{StateCell, WorkerState};
use crate::tasks::{CompletionHook, Task};

/// Dedicated-process backend for one worker.
pub(crate) struct ProcessBackend {
    name: String,
    state: Arc<StateCell>,
    /// Cleared by the reader thread on fault or unexpected host exit.
    alive: Arc<AtomicBool>,
    seq: AtomicU64,
    hooks: Arc<Mutex<HashMap<u64, CompletionHook>>>,
    child: Mutex<Child>,
    /// Staging channel into the writer thread. `None` once shutdown was
    /// signaled; dropping the sender closes the channel and, through the
    /// writer, the child's stdin.
    queue: Mutex<Option<Sender<HostRequest>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessBackend {
    /// Launches the host process; its loop immediately blocks waiting for
    /// work. `cfg.host_command = None` launches the current executable, which
    /// must call [`run_if_child`](crate::run_if_child) early in `main`.
    pub(crate) fn spawn(name: &str, cfg: &WorkerConfig) -> Result<Self, WorkerError> {
        let program = match &cfg.host_command {
            Some(cmd) => cmd.clone(),
            None => std::env::current_exe().map_err(|source| WorkerError::Spawn { source })?,
        };

        let mut child = Command::new(&program)
            .args(&cfg.host_args)
            .env(HOST_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| WorkerError::Spawn { source })?;

        let stdin = child.stdin.take().ok_or_else(|| WorkerError::Spawn {
            source: std::io::Error::other("host stdin pipe missing"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::Spawn {
            source: std::io::Error::other("host stdout pipe missing"),
        })?;

        let state = Arc::new(StateCell::new());
        let alive = Arc::new(AtomicBool::new(true));
        let hooks: Arc<Mutex<HashMap<u64, CompletionHook>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let (tx, rx) = mpsc::channel::<HostRequest>();
        let writer = spawn_writer(name.to_string(), stdin, rx, Arc::clone(&alive))
            .map_err(|source| WorkerError::Spawn { source })?;
        let reader = spawn_reader(
            name.to_string(),
            stdout,
            Arc::clone(&state),
            Arc::clone(&alive),
            Arc::clone(&hooks),
        )
        .map_err(|source| WorkerError::Spawn { source })?;

        Ok(Self {
            name: name.to_string(),
            state,
            alive,
            seq: AtomicU64::new(0),
            hooks,
            child: Mutex::new(child),
            queue: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
            reader: Mutex::new(Some(reader)),
        })
    }

    fn dead(&self) -> WorkerError {
        WorkerError::WorkerDead {
            name: self.name.clone(),
        }
    }

    /// Hands `frame` to the writer thread. A channel send, never a pipe
    /// write: the caller does not suspend even when the child is busy and the
    /// stdin pipe is full.
    fn stage_frame(&self, frame: HostRequest) -> Result<(), WorkerError> {
        let guard = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let tx = guard.as_ref().ok_or_else(|| self.dead())?;
        tx.send(frame).map_err(|_| self.dead())
    }
}

impl Backend for ProcessBackend {
    fn enqueue(&self, task: Task) -> Result<(), WorkerError> {
        let Task {
            handler,
            args,
            kwargs,
            hook,
        } = task;

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = hook {
            self.hooks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(seq, hook);
        }

        let frame = HostRequest::Run {
            seq,
            handler,
            args,
            kwargs,
        };
        if let Err(err) = self.stage_frame(frame) {
            // The hook will never fire; drop it.
            self.hooks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&seq);
            return Err(err);
        }
        Ok(())
    }

    fn signal_shutdown(&self) -> Result<(), WorkerError> {
        self.stage_frame(HostRequest::Shutdown)?;
        // Dropping the sender lets the writer finish and close the child's
        // stdin — EOF backs up the sentinel in case the host misses the frame.
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        Ok(())
    }

    fn state(&self) -> WorkerState {
        self.state.load()
    }

    fn state_cell(&self) -> Arc<StateCell> {
        Arc::clone(&self.state)
    }

    fn is_alive(&self) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        matches!(child.try_wait(), Ok(None))
    }

    fn join(&self) -> Result<(), WorkerError> {
        // Close the staging channel even if shutdown was never signaled; the
        // writer drains what was staged, then drops the child's stdin (EOF).
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = writer {
            let _ = handle.join();
        }

        let status = {
            let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
            child.wait().map_err(|source| WorkerError::Spawn { source })?
        };
        if !status.success() {
            log::debug!("worker {} host exited with {status}", self.name);
        }

        // The pipe is closed once the host exits; the reader drains what is
        // left and finishes. Joining it here guarantees every State/Done
        // frame was applied before close() returns.
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = reader {
            let _ = handle.join();
        }
        Ok(())
    }
}

/// Drains staged frames into the child's stdin.
///
/// This is the only place the stdin pipe is written: blocking on a full pipe
/// stalls this thread, never a submitter. Exits after the shutdown sentinel,
/// when the channel closes, or when the pipe breaks; dropping `stdin` on the
/// way out delivers EOF to the host.
fn spawn_writer(
    name: String,
    mut stdin: ChildStdin,
    rx: Receiver<HostRequest>,
    alive: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{name}-feed"))
        .spawn(move || {
            for frame in rx {
                let Ok(line) = serde_json::to_string(&frame) else {
                    continue;
                };
                if writeln!(stdin, "{line}").is_err() {
                    log::error!("worker {name} host stdin pipe broke");
                    alive.store(false, Ordering::Release);
                    break;
                }
                if matches!(frame, HostRequest::Shutdown) {
                    break;
                }
            }
        })
}

fn spawn_reader(
    name: String,
    stdout: std::process::ChildStdout,
    state: Arc<StateCell>,
    alive: Arc<AtomicBool>,
    hooks: Arc<Mutex<HashMap<u64, CompletionHook>>>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{name}-pipe"))
        .spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostReply>(&line) {
                    Ok(HostReply::State(s)) => state.store(s),
                    Ok(HostReply::Done { seq, value }) => {
                        let hook = hooks.lock().unwrap_or_else(|e| e.into_inner()).remove(&seq);
                        if let Some(hook) = hook {
                            hook(value);
                        }
                    }
                    Ok(HostReply::Fault { seq, error }) => {
                        log::error!("worker {name} host fault (seq={seq:?}): {error}");
                        alive.store(false, Ordering::Release);
                    }
                    Err(err) => {
                        log::error!("worker {name} host sent undecodable frame: {err}");
                    }
                }
            }
            if state.load() != WorkerState::Closed {
                // The host went away without processing the sentinel.
                alive.store(false, Ordering::Release);
            }
        })
}
