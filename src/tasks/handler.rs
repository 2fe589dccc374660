//! # Handler abstraction and function-backed handler implementation.
//!
//! This module defines the [`Callable`] trait (the executable side of a task)
//! and a convenient function-backed implementation [`HandlerFn`]. The common
//! handle type is [`HandlerRef`], an `Arc<dyn Callable>` suitable for sharing
//! across threads and storing in a [`HandlerRegistry`](crate::HandlerRegistry).
//!
//! A handler receives the task's positional and keyword arguments (empty
//! slices/maps when absent) and returns either a JSON value — delivered to the
//! task's completion hook, if any — or a [`TaskError`], which is fatal to the
//! worker that executed it.

use std::sync::Arc;

use serde_json::Value;

use crate::error::TaskError;

/// JSON object map used for keyword arguments.
pub type JsonMap = serde_json::Map<String, Value>;

/// Shared handle to a registered handler.
pub type HandlerRef = Arc<dyn Callable>;

/// # Named, synchronous unit of work.
///
/// Implementations must be thread-safe: the same handler instance may be
/// resolved by a thread-backed worker and, in a host process, by the host
/// loop.
///
/// # Example
/// ```
/// use serde_json::Value;
/// use spindle::{Callable, JsonMap, TaskError};
///
/// struct Sum;
///
/// impl Callable for Sum {
///     fn call(&self, args: &[Value], _kwargs: &JsonMap) -> Result<Value, TaskError> {
///         let total: i64 = args.iter().filter_map(Value::as_i64).sum();
///         Ok(Value::from(total))
///     }
/// }
/// ```
pub trait Callable: Send + Sync + 'static {
    /// Executes the handler with the task's arguments.
    ///
    /// `args` and `kwargs` are empty when the task supplied none; the four
    /// combinations (neither / positional / keyword / both) are all valid.
    fn call(&self, args: &[Value], kwargs: &JsonMap) -> Result<Value, TaskError>;
}

/// Function-backed handler implementation.
///
/// Wraps a plain `Fn` closure so simple handlers need no dedicated type.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&[Value], &JsonMap) -> Result<Value, TaskError> + Send + Sync + 'static,
{
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use serde_json::Value;
    /// use spindle::{HandlerFn, HandlerRef};
    ///
    /// let h: HandlerRef = HandlerFn::arc(|args, _kwargs| {
    ///     Ok(Value::from(args.len()))
    /// });
    /// ```
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Callable for HandlerFn<F>
where
    F: Fn(&[Value], &JsonMap) -> Result<Value, TaskError> + Send + Sync + 'static,
{
    fn call(&self, args: &[Value], kwargs: &JsonMap) -> Result<Value, TaskError> {
        (self.f)(args, kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handler_fn_forwards_arguments() {
        let h = HandlerFn::new(|args: &[Value], kwargs: &JsonMap| {
            Ok(json!({ "args": args.len(), "kwargs": kwargs.len() }))
        });

        let mut kwargs = JsonMap::new();
        kwargs.insert("k".into(), json!(1));

        let out = h.call(&[json!(1), json!(2)], &kwargs).unwrap();
        assert_eq!(out, json!({ "args": 2, "kwargs": 1 }));
    }

    #[test]
    fn test_handler_fn_propagates_failure() {
        let h = HandlerFn::new(|_: &[Value], _: &JsonMap| {
            Err(TaskError::Failed {
                error: "boom".into(),
            })
        });
        let err = h.call(&[], &JsonMap::new()).unwrap_err();
        assert_eq!(err.as_label(), "task_failed");
    }
}
