//! Reference worker host binary (demo/reference only).
//!
//! Serves a small fixed handler set over the worker host protocol. Useful for
//! trying out the process backend and as the target of integration tests;
//! real deployments embed [`spindle::run_host`] (or
//! [`spindle::run_if_child`]) in their own binary with their own handlers.
//!
//! Handlers:
//! - `add`        — sums integer positional args, returns the total
//! - `echo`       — returns `{ "args": [...], "kwargs": {...} }`
//! - `sleep-ms`   — sleeps `kwargs.ms` milliseconds, returns null
//! - `boom`       — always fails (fatal to the worker, by contract)

use std::time::Duration;

use serde_json::{json, Value};
use spindle::{HandlerRegistry, TaskError};

fn build_handlers() -> Result<HandlerRegistry, spindle::WorkerError> {
    let mut handlers = HandlerRegistry::new();

    handlers.register_fn("add", |args, _kwargs| {
        Ok(Value::from(
            args.iter().filter_map(Value::as_i64).sum::<i64>(),
        ))
    })?;

    handlers.register_fn("echo", |args, kwargs| {
        Ok(json!({ "args": args, "kwargs": kwargs }))
    })?;

    handlers.register_fn("sleep-ms", |_args, kwargs| {
        let ms = kwargs.get("ms").and_then(Value::as_u64).unwrap_or(0);
        std::thread::sleep(Duration::from_millis(ms));
        Ok(Value::Null)
    })?;

    handlers.register_fn("boom", |_args, _kwargs| {
        Err(TaskError::Failed {
            error: "boom".into(),
        })
    })?;

    Ok(handlers)
}

fn main() {
    let handlers = match build_handlers() {
        Ok(handlers) => handlers,
        Err(err) => {
            eprintln!("spindle-host: {err}");
            std::process::exit(2);
        }
    };
    std::process::exit(spindle::run_host(&handlers));
}
