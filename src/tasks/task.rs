//! # Task: one unit of deferred work.
//!
//! A [`Task`] is an inert record: the name of a registered handler, optional
//! positional arguments, optional keyword arguments, and an optional
//! completion hook invoked with the handler's return value. Tasks are created
//! by the submitting code, owned by the worker's private queue until dequeued,
//! and destroyed after execution.
//!
//! All four argument combinations are supported: no args, positional only,
//! keyword only, or both.
//!
//! The shutdown sentinel is **not** a task: it is the distinct
//! [`Envelope::Shutdown`] variant, recognized by the worker loop and never
//! executed.
//!
//! ## Example
//! ```
//! use serde_json::json;
//! use spindle::Task;
//!
//! let task = Task::new("add")
//!     .with_args(vec![json!(2), json!(3)])
//!     .on_complete(|value| println!("sum = {value}"));
//!
//! assert_eq!(task.handler(), "add");
//! ```

use serde_json::Value;

use crate::tasks::handler::JsonMap;

/// Callback invoked with the handler's return value after a task completes.
///
/// For a thread-backed worker the hook runs on the worker thread; for a
/// process-backed worker it stays in the parent and runs on the control-pipe
/// reader thread when the completion frame arrives.
pub type CompletionHook = Box<dyn FnOnce(Value) + Send + 'static>;

/// One unit of deferred work, submitted to a [`TaskWorker`](crate::TaskWorker).
pub struct Task {
    pub(crate) handler: String,
    pub(crate) args: Option<Vec<Value>>,
    pub(crate) kwargs: Option<JsonMap>,
    pub(crate) hook: Option<CompletionHook>,
}

impl Task {
    /// Creates a task invoking the handler registered under `handler`,
    /// with no arguments and no completion hook.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            args: None,
            kwargs: None,
            hook: None,
        }
    }

    /// Sets the positional arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    /// Sets the keyword arguments.
    pub fn with_kwargs(mut self, kwargs: JsonMap) -> Self {
        self.kwargs = Some(kwargs);
        self
    }

    /// Sets the completion hook, invoked once with the handler's return value.
    pub fn on_complete(mut self, hook: impl FnOnce(Value) + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Returns the handler name this task will invoke.
    pub fn handler(&self) -> &str {
        &self.handler
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("handler", &self.handler)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Item traveling through a worker's private queue: either a task to run or
/// the shutdown sentinel.
pub(crate) enum Envelope {
    Run(Task),
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_supports_all_argument_combinations() {
        let bare = Task::new("noop");
        assert!(bare.args.is_none() && bare.kwargs.is_none());

        let positional = Task::new("add").with_args(vec![json!(1), json!(2)]);
        assert_eq!(positional.args.as_ref().map(Vec::len), Some(2));
        assert!(positional.kwargs.is_none());

        let mut map = JsonMap::new();
        map.insert("ms".into(), json!(5));
        let keyword = Task::new("sleep-ms").with_kwargs(map.clone());
        assert!(keyword.args.is_none());
        assert!(keyword.kwargs.is_some());

        let both = Task::new("mix").with_args(vec![json!(1)]).with_kwargs(map);
        assert!(both.args.is_some() && both.kwargs.is_some());
    }

    #[test]
    fn test_debug_reports_hook_presence_not_contents() {
        let task = Task::new("add").on_complete(|_| {});
        let rendered = format!("{task:?}");
        assert!(rendered.contains("hook: true"));
    }
}
