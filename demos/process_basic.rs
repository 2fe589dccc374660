//! Process-backed worker where the demo binary serves as its own host.
//!
//! `run_if_child` is called first thing in `main`: the parent run falls
//! through it, while the spawned child (same executable, marked via the
//! `SPINDLE_WORKER_HOST` env var) serves the handler set and never returns.
//!
//! ```bash
//! cargo run --example process_basic
//! ```

use std::sync::{mpsc, Arc};

use serde_json::{json, Value};
use spindle::{BackendKind, HandlerRegistry, Task, TaskWorker, WorkerConfig, WorkerRegistry};

fn build_handlers() -> Result<HandlerRegistry, spindle::WorkerError> {
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("add", |args, _kwargs| {
        Ok(Value::from(
            args.iter().filter_map(Value::as_i64).sum::<i64>(),
        ))
    })?;
    Ok(handlers)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handlers = build_handlers()?;
    spindle::run_if_child(&handlers); // child executions stop here

    let registry = WorkerRegistry::arc();
    let worker = TaskWorker::spawn(
        WorkerConfig::new(BackendKind::Process, "proc"),
        Arc::new(handlers),
        Arc::clone(&registry),
    )?;
    println!("spawned {} (status: {})", worker.name(), worker.status());

    let (tx, rx) = mpsc::channel();
    worker.submit(
        Task::new("add")
            .with_args(vec![json!(40), json!(2)])
            .on_complete(move |value| {
                let _ = tx.send(value);
            }),
    )?;
    println!("completed: {}", rx.recv()?);

    worker.close()?;
    println!("closed (status: {})", worker.status());
    Ok(())
}
