//! Thread-backed worker: submit a few tasks, observe completion, close.
//!
//! ```bash
//! cargo run --example thread_basic
//! ```

use std::sync::{mpsc, Arc};

use serde_json::{json, Value};
use spindle::{HandlerRegistry, Task, TaskWorker, WorkerConfig, WorkerRegistry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut handlers = HandlerRegistry::new();
    handlers.register_fn("add", |args, _kwargs| {
        Ok(Value::from(
            args.iter().filter_map(Value::as_i64).sum::<i64>(),
        ))
    })?;

    let registry = WorkerRegistry::arc();
    let worker = TaskWorker::spawn(
        WorkerConfig::default(),
        Arc::new(handlers),
        Arc::clone(&registry),
    )?;
    println!("spawned {} (status: {})", worker.name(), worker.status());

    let (tx, rx) = mpsc::channel();
    for i in 0..5 {
        let tx = tx.clone();
        worker.submit(
            Task::new("add")
                .with_args(vec![json!(i), json!(i)])
                .on_complete(move |value| {
                    let _ = tx.send(value);
                }),
        )?;
    }
    drop(tx);

    while let Ok(value) = rx.recv() {
        println!("completed: {value}");
    }

    worker.close()?;
    println!("closed (registry empty: {})", registry.is_empty());
    Ok(())
}
