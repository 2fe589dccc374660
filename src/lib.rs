//! # spindle
//!
//! **Spindle** is a single dedicated-worker task execution primitive.
//!
//! Each [`TaskWorker`] owns exactly one background execution unit — a
//! dedicated OS thread or a dedicated OS process — and exposes a small
//! asynchronous contract: submit work (fire-and-forget, optionally with a
//! completion hook), observe a three-state machine, and shut down gracefully
//! with a blocking `close()`. It is designed as a building block for
//! higher-level pools and orchestrators, which are out of scope here.
//!
//! ## Architecture
//! ```text
//!              ┌────────────────────────────────────────────┐
//!   caller ──► │  TaskWorker (facade, single-use)           │
//!              │  - unique name (prefix + random suffix)    │
//!              │  - submit() / status() / close()           │
//!              │  - registers into WorkerRegistry           │
//!              └───────┬────────────────────────┬───────────┘
//!                      ▼                        ▼
//!            ┌──────────────────┐     ┌───────────────────────┐
//!            │  ThreadBackend   │     │  ProcessBackend       │
//!            │  mpsc channel    │     │  stdin  = task queue  │
//!            │  OS thread loop  │     │  stdout = control pipe│
//!            └────────┬─────────┘     └──────────┬────────────┘
//!                     │                          │
//!                     ▼                          ▼
//!              shared worker loop (drive):
//!                blocking dequeue ─► sentinel? Closed, exit
//!                                 ─► Pending ─► invoke handler
//!                                 ─► completion hook ─► Free ─► repeat
//! ```
//!
//! Tasks name a handler registered in a [`HandlerRegistry`]; the process
//! backend cannot ship closures across the boundary, so both sides build the
//! same registry from the same code and agree on names. Completion hooks stay
//! on the creator's side for both backends.
//!
//! ## Guarantees
//! - **FIFO**: a worker executes tasks strictly in submission order.
//! - **Graceful shutdown**: the sentinel travels the same queue, so `close()`
//!   runs after every previously submitted task; it blocks until the unit has
//!   fully terminated (thread join / process wait).
//! - **Accurate status**: [`WorkerState`] is creator-visible for both
//!   backends (the process backend mirrors transitions over a control pipe).
//! - **Fail-fast on dead workers**: a task failure is fatal to its worker;
//!   later `submit`/`close` report [`WorkerError::WorkerDead`] instead of
//!   hanging.
//!
//! ## Example
//! ```
//! use std::sync::{Arc, mpsc};
//! use serde_json::{json, Value};
//! use spindle::{HandlerRegistry, Task, TaskWorker, WorkerConfig, WorkerRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut handlers = HandlerRegistry::new();
//!     handlers.register_fn("add", |args, _kwargs| {
//!         Ok(Value::from(args.iter().filter_map(Value::as_i64).sum::<i64>()))
//!     })?;
//!
//!     let registry = WorkerRegistry::arc();
//!     let worker = TaskWorker::spawn(
//!         WorkerConfig::default(),
//!         Arc::new(handlers),
//!         Arc::clone(&registry),
//!     )?;
//!     assert_eq!(registry.list(), vec![worker.name().to_string()]);
//!
//!     let (tx, rx) = mpsc::channel();
//!     worker.submit(
//!         Task::new("add")
//!             .with_args(vec![json!(2), json!(3)])
//!             .on_complete(move |value| { let _ = tx.send(value); }),
//!     )?;
//!     assert_eq!(rx.recv()?, json!(5));
//!
//!     worker.close()?;
//!     assert!(registry.is_empty());
//!     Ok(())
//! }
//! ```

mod backend;
mod config;
mod error;
mod registry;
mod state;
mod tasks;
mod worker;

// ---- Public re-exports ----

pub use backend::host::{run_host, run_if_child, HOST_ENV};
pub use config::{BackendKind, WorkerConfig};
pub use error::{TaskError, WorkerError};
pub use registry::{WorkerEntry, WorkerRegistry};
pub use state::WorkerState;
pub use tasks::{Callable, CompletionHook, HandlerFn, HandlerRef, HandlerRegistry, JsonMap, Task};
pub use worker::TaskWorker;
