//! # Process host: the child-process side of a process-backed worker.
//!
//! A process-backed worker launches a host executable and speaks a small
//! line-delimited JSON protocol with it over the standard pipes:
//!
//! ```text
//! parent ──(stdin)──►  child            child ──(stdout)──► parent
//!   Run { seq, handler, args, kwargs }    State(free|pending|closed)
//!   Shutdown                              Done  { seq, value }
//!                                         Fault { seq?, error }
//! ```
//!
//! stdin is the worker's private FIFO queue; stdout is the control pipe that
//! carries status transitions and completion values back to the parent. The
//! parent applies `State` frames to its own [`WorkerState`] cell, which is
//! what makes `status()` accurate across the process boundary (a plain field
//! mutated in the child would only ever be the fork-time snapshot).
//!
//! ## Embedding
//! The host must register the same handler names the parent submits. Either
//! run a dedicated host binary (the crate ships `spindle-host` as a
//! reference), or have your own binary call [`run_if_child`] early in `main`
//! so it can serve as its own host:
//!
//! ```no_run
//! use spindle::HandlerRegistry;
//!
//! fn main() {
//!     let handlers = HandlerRegistry::new(); // register your handlers here
//!     spindle::run_if_child(&handlers);      // exits here in the child
//!     // ... normal program ...
//! }
//! ```

use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{drive, StateSink};
use crate::state::WorkerState;
use crate::tasks::{HandlerRegistry, JsonMap};

/// Environment variable marking a spawned child as a worker host.
///
/// Set by the process backend; checked by [`run_if_child`].
pub const HOST_ENV: &str = "SPINDLE_WORKER_HOST";

/// Frame sent from the parent to the host over stdin.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum HostRequest {
    /// Execute one task.
    Run {
        seq: u64,
        handler: String,
        args: Option<Vec<Value>>,
        kwargs: Option<JsonMap>,
    },
    /// Graceful shutdown sentinel.
    Shutdown,
}

/// Frame sent from the host to the parent over stdout.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum HostReply {
    /// State transition mirror.
    State(WorkerState),
    /// Task `seq` completed with `value`.
    Done { seq: u64, value: Value },
    /// Task `seq` failed (or a frame could not be decoded, `seq: None`).
    /// The host exits right after sending this.
    Fault { seq: Option<u64>, error: String },
}

/// Control-pipe sink: records the transition locally in frame form.
struct PipeSink<'a, W: Write> {
    out: Mutex<W>,
    faulted: &'a Cell<bool>,
}

impl<'a, W: Write> PipeSink<'a, W> {
    fn new(out: W, faulted: &'a Cell<bool>) -> Self {
        Self {
            out: Mutex::new(out),
            faulted,
        }
    }

    fn reply(&self, reply: &HostReply) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // The parent going away mid-write is not recoverable from here.
        if let Ok(line) = serde_json::to_string(reply) {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

impl<W: Write> StateSink for PipeSink<'_, W> {
    fn transition(&self, state: WorkerState) {
        // A fault is not a graceful shutdown; never advertise Closed after
        // one — the parent must see the worker as dead, not closed.
        if state == WorkerState::Closed && self.faulted.get() {
            return;
        }
        self.reply(&HostReply::State(state));
    }
}

/// Runs the worker host loop over the current process's stdin/stdout.
///
/// Blocks until the shutdown sentinel arrives (returns `0`), stdin reaches
/// EOF because the parent went away (returns `0`), or a task fails (returns
/// `1`, after emitting a `Fault` frame — task failure is fatal to the worker
/// by contract).
pub fn run_host(handlers: &HandlerRegistry) -> i32 {
    run_host_io(handlers, io::stdin().lock(), io::stdout())
}

/// Runs the host loop and exits the process if [`HOST_ENV`] is set.
///
/// Call this early in `main` of any binary that should be able to serve as
/// its own worker host (the default when
/// [`WorkerConfig::host_command`](crate::WorkerConfig::host_command) is
/// `None`). A no-op in ordinary runs.
pub fn run_if_child(handlers: &HandlerRegistry) {
    if std::env::var_os(HOST_ENV).is_some() {
        std::process::exit(run_host(handlers));
    }
}

fn run_host_io<R: BufRead, W: Write>(handlers: &HandlerRegistry, input: R, output: W) -> i32 {
    let faulted = Cell::new(false);
    let sink = PipeSink::new(output, &faulted);
    let mut lines = input.lines();

    drive(
        &sink,
        || loop {
            let line = match lines.next() {
                Some(Ok(line)) => line,
                // EOF or a broken pipe: the parent is gone, stop quietly.
                Some(Err(_)) | None => return None,
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HostRequest>(&line) {
                Ok(HostRequest::Run {
                    seq,
                    handler,
                    args,
                    kwargs,
                }) => return Some((seq, handler, args, kwargs)),
                Ok(HostRequest::Shutdown) => return None,
                Err(err) => {
                    sink.reply(&HostReply::Fault {
                        seq: None,
                        error: format!("undecodable frame: {err}"),
                    });
                    faulted.set(true);
                    return None;
                }
            }
        },
        |(seq, handler, args, kwargs): (u64, String, Option<Vec<Value>>, Option<JsonMap>)| {
            match handlers.invoke(&handler, args.as_deref(), kwargs.as_ref()) {
                Ok(value) => {
                    sink.reply(&HostReply::Done { seq, value });
                    Ok(())
                }
                Err(err) => {
                    sink.reply(&HostReply::Fault {
                        seq: Some(seq),
                        error: err.as_message(),
                    });
                    faulted.set(true);
                    Err(err)
                }
            }
        },
    );

    if faulted.get() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handlers() -> HandlerRegistry {
        let mut handlers = HandlerRegistry::new();
        handlers
            .register_fn("add", |args, _| {
                Ok(Value::from(
                    args.iter().filter_map(Value::as_i64).sum::<i64>(),
                ))
            })
            .unwrap();
        handlers
            .register_fn("boom", |_, _| {
                Err(crate::TaskError::Failed {
                    error: "boom".into(),
                })
            })
            .unwrap();
        handlers
    }

    fn run(input: &str) -> (i32, Vec<HostReply>) {
        let mut out: Vec<u8> = Vec::new();
        let code = run_host_io(&handlers(), input.as_bytes(), &mut out);
        let replies = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (code, replies)
    }

    #[test]
    fn test_host_runs_task_and_shuts_down() {
        let req = serde_json::to_string(&HostRequest::Run {
            seq: 1,
            handler: "add".into(),
            args: Some(vec![json!(2), json!(3)]),
            kwargs: None,
        })
        .unwrap();
        let shutdown = serde_json::to_string(&HostRequest::Shutdown).unwrap();

        let (code, replies) = run(&format!("{req}\n{shutdown}\n"));
        assert_eq!(code, 0);

        // Pending → Done(5) → Free → Closed, in order.
        assert!(matches!(replies[0], HostReply::State(WorkerState::Pending)));
        assert!(matches!(&replies[1], HostReply::Done { seq: 1, value } if *value == json!(5)));
        assert!(matches!(replies[2], HostReply::State(WorkerState::Free)));
        assert!(matches!(replies[3], HostReply::State(WorkerState::Closed)));
    }

    #[test]
    fn test_host_eof_is_graceful() {
        let (code, replies) = run("");
        assert_eq!(code, 0);
        assert!(matches!(replies[0], HostReply::State(WorkerState::Closed)));
    }

    #[test]
    fn test_host_task_failure_is_fatal() {
        let req = serde_json::to_string(&HostRequest::Run {
            seq: 7,
            handler: "boom".into(),
            args: None,
            kwargs: None,
        })
        .unwrap();
        let (code, replies) = run(&format!("{req}\n"));
        assert_eq!(code, 1);
        assert!(matches!(replies[0], HostReply::State(WorkerState::Pending)));
        assert!(matches!(&replies[1], HostReply::Fault { seq: Some(7), .. }));
        // No Free, no Closed after a fault.
        assert_eq!(replies.len(), 2);
    }

    #[test]
    fn test_host_rejects_garbage_frame() {
        let (code, replies) = run("not json\n");
        assert_eq!(code, 1);
        assert!(matches!(&replies[0], HostReply::Fault { seq: None, .. }));
        // No Closed after a protocol fault: like a task failure, the worker
        // is dead, not gracefully shut down.
        assert_eq!(replies.len(), 1);
    }
}
