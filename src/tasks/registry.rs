//! # Handler registry: name → handler resolution.
//!
//! [`HandlerRegistry`] maps stable handler names to [`HandlerRef`]s. Workers
//! resolve the handler named by each dequeued task against this registry and
//! invoke it with whichever argument combination the task supplied.
//!
//! ## Rules
//! - Registration happens up front, before workers are spawned; the registry
//!   is then shared immutably (`Arc`).
//! - Duplicate names are rejected at registration time.
//! - For a process-backed worker, the **host process must register the same
//!   names** — the registry is the cross-process contract.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use serde_json::Value;
//! use spindle::HandlerRegistry;
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers
//!     .register_fn("add", |args, _kwargs| {
//!         let total: i64 = args.iter().filter_map(Value::as_i64).sum();
//!         Ok(Value::from(total))
//!     })
//!     .unwrap();
//!
//! let handlers = Arc::new(handlers);
//! assert_eq!(handlers.names(), vec!["add".to_string()]);
//! ```

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{TaskError, WorkerError};
use crate::tasks::handler::{HandlerFn, HandlerRef, JsonMap};

/// Registry of named task handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerRef>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`.
    ///
    /// Fails with [`WorkerError::DuplicateHandler`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: HandlerRef,
    ) -> Result<(), WorkerError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(WorkerError::DuplicateHandler { handler: name });
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Registers a plain closure under `name`.
    ///
    /// Shorthand for `register(name, HandlerFn::arc(f))`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), WorkerError>
    where
        F: Fn(&[Value], &JsonMap) -> Result<Value, TaskError> + Send + Sync + 'static,
    {
        self.register(name, HandlerFn::arc(f))
    }

    /// Returns the handler registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<HandlerRef> {
        self.handlers.get(name).cloned()
    }

    /// Returns the sorted list of registered handler names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Resolves `name` and invokes the handler with the task's arguments.
    ///
    /// Absent argument sets are passed as empty; all four combinations
    /// (neither / positional / keyword / both) invoke the same handler.
    pub fn invoke(
        &self,
        name: &str,
        args: Option<&[Value]>,
        kwargs: Option<&JsonMap>,
    ) -> Result<Value, TaskError> {
        let handler = self.get(name).ok_or_else(|| TaskError::HandlerNotFound {
            handler: name.to_string(),
        })?;

        static EMPTY_ARGS: [Value; 0] = [];
        let empty_kwargs = JsonMap::new();
        handler.call(
            args.unwrap_or(&EMPTY_ARGS),
            kwargs.unwrap_or(&empty_kwargs),
        )
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.names())
            .finish()
    }
}
