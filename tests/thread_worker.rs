//! End-to-end scenarios for the thread-backed worker.

use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use spindle::{
    BackendKind, HandlerRegistry, Task, TaskWorker, WorkerConfig, WorkerError, WorkerRegistry,
    WorkerState,
};

/// Polls `probe` every few milliseconds until it returns true or `deadline`
/// elapses.
fn wait_until(deadline: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if probe() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

fn spawn_worker(handlers: HandlerRegistry) -> (TaskWorker, Arc<WorkerRegistry>) {
    let registry = WorkerRegistry::arc();
    let worker = TaskWorker::spawn(
        WorkerConfig::default(),
        Arc::new(handlers),
        Arc::clone(&registry),
    )
    .unwrap();
    (worker, registry)
}

fn arithmetic_handlers() -> HandlerRegistry {
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
            Err(spindle::TaskError::Failed {
                error: "boom".into(),
            })
        })
        .unwrap();
    handlers
}

#[test]
fn test_completion_hook_fires_exactly_once_with_result() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());

    let (tx, rx) = mpsc::channel();
    worker
        .submit(
            Task::new("add")
                .with_args(vec![json!(2), json!(3)])
                .on_complete(move |value| {
                    let _ = tx.send(value);
                }),
        )
        .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), json!(5));
    // Exactly once: no second delivery.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    worker.close().unwrap();
}

#[test]
fn test_task_without_hook_completes_silently() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());

    worker
        .submit(Task::new("add").with_args(vec![json!(1), json!(1)]))
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        worker.status() == WorkerState::Free
    }));
    worker.close().unwrap();
    assert_eq!(worker.status(), WorkerState::Closed);
}

#[test]
fn test_fifo_order_over_hundred_tasks() {
    let seen: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut handlers = HandlerRegistry::new();
    handlers
        .register_fn("record", move |args, _| {
            let index = args[0].as_i64().unwrap();
            sink.lock().unwrap().push(index);
            Ok(Value::Null)
        })
        .unwrap();

    let (worker, _registry) = spawn_worker(handlers);
    for i in 0..100i64 {
        worker
            .submit(Task::new("record").with_args(vec![json!(i)]))
            .unwrap();
    }

    // close() drains the FIFO queue before the sentinel is processed.
    worker.close().unwrap();
    assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<i64>>());
}

#[test]
fn test_status_is_pending_only_while_executing() {
    let mut handlers = arithmetic_handlers();
    handlers
        .register_fn("slow", |_, _| {
            std::thread::sleep(Duration::from_millis(400));
            Ok(Value::Null)
        })
        .unwrap();

    let (worker, _registry) = spawn_worker(handlers);
    assert_eq!(worker.status(), WorkerState::Free);

    worker.submit(Task::new("slow")).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        worker.status() == WorkerState::Pending
    }));
    assert!(wait_until(Duration::from_secs(2), || {
        worker.status() == WorkerState::Free
    }));

    worker.close().unwrap();
}

#[test]
fn test_close_terminates_the_unit() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());
    assert!(worker.is_running());

    worker.close().unwrap();
    assert!(!worker.is_running());
    assert_eq!(worker.status(), WorkerState::Closed);
}

#[test]
fn test_second_close_fails_without_blocking() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());
    worker.close().unwrap();

    assert!(matches!(
        worker.close(),
        Err(WorkerError::AlreadyClosed { .. })
    ));
}

#[test]
fn test_submit_after_close_is_rejected() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());
    worker.close().unwrap();

    assert!(matches!(
        worker.submit(Task::new("add")),
        Err(WorkerError::WorkerClosed { .. })
    ));
}

#[test]
fn test_same_prefix_yields_distinct_names() {
    let registry = WorkerRegistry::arc();
    let a = TaskWorker::spawn(
        WorkerConfig::default(),
        Arc::new(arithmetic_handlers()),
        Arc::clone(&registry),
    )
    .unwrap();
    let b = TaskWorker::spawn(
        WorkerConfig::default(),
        Arc::new(arithmetic_handlers()),
        Arc::clone(&registry),
    )
    .unwrap();

    assert_ne!(a.name(), b.name());
    assert_eq!(registry.len(), 2);

    a.close().unwrap();
    b.close().unwrap();
    assert!(registry.is_empty());
}

#[test]
fn test_registry_tracks_lifecycle() {
    let (worker, registry) = spawn_worker(arithmetic_handlers());
    assert_eq!(registry.list(), vec![worker.name().to_string()]);
    assert_eq!(
        registry.states(),
        vec![(worker.name().to_string(), WorkerState::Free)]
    );

    let entry = registry.get(worker.name()).unwrap();
    assert_eq!(entry.kind(), BackendKind::Thread);
    assert_eq!(entry.state(), WorkerState::Free);

    worker.close().unwrap();
    assert!(!registry.contains(worker.name()));
    assert!(registry.get(worker.name()).is_none());
}

#[test]
fn test_failing_task_kills_worker_and_submissions_fail_fast() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());

    worker.submit(Task::new("boom")).unwrap();
    assert!(wait_until(Duration::from_secs(5), || !worker.is_running()));

    assert!(matches!(
        worker.submit(Task::new("add")),
        Err(WorkerError::WorkerDead { .. })
    ));
    assert!(matches!(
        worker.close(),
        Err(WorkerError::WorkerDead { .. })
    ));
}

#[test]
fn test_unknown_handler_is_fatal_like_any_task_failure() {
    let (worker, _registry) = spawn_worker(arithmetic_handlers());

    worker.submit(Task::new("no-such-handler")).unwrap();
    assert!(wait_until(Duration::from_secs(5), || !worker.is_running()));
    assert!(matches!(
        worker.submit(Task::new("add")),
        Err(WorkerError::WorkerDead { .. })
    ));
}
