//! Task data model and handler registration.
//!
//! A [`Task`] names a registered handler and carries its arguments; the
//! [`HandlerRegistry`] maps handler names to [`Callable`] implementations.
//! Handlers are resolved by name rather than submitted as closures because a
//! process-backed worker cannot ship a closure across the process boundary:
//! both sides of the boundary construct the same registry from the same code
//! and agree on names.

mod handler;
mod registry;
mod task;

pub use handler::{Callable, HandlerFn, HandlerRef, JsonMap};
pub use registry::HandlerRegistry;
pub use task::{CompletionHook, Task};

pub(crate) use task::Envelope;
