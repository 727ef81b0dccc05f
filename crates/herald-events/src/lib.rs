//! Typed publish/subscribe with deferred delivery.
//!
//! Listeners register a [`Callback`] for an event-data type and get back a
//! [`ListenerId`]. Dispatching an event schedules one deferred call per
//! listener registered on the event's type or any of its ancestors; the
//! calls run later on a [`Scheduler`] such as [`TokioRunner`] or
//! [`ManualRunner`].

mod callback;
mod dispatcher;
mod error;
mod event;
mod listener;
mod registry;
mod runner;
mod scheduler;
mod set;

pub use callback::Callback;
pub use dispatcher::{Dispatcher, DispatcherBuilder, EventArgsExt};
pub use error::{DispatchError, Result, RunnerError};
pub use event::{ancestry, downcast_ancestor, EventArgs, EventType, Reflect, Sender};
pub use listener::ListenerId;
pub use registry::Registry;
pub use runner::{ManualRunner, RunnerOptions, TokioRunner};
pub use scheduler::{DeferredCall, Scheduler};
