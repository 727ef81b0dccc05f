use std::sync::Arc;
use std::time::Duration;

/// A zero-argument unit of work: one listener invocation with its sender
/// and event already captured.
pub type DeferredCall = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run deferred calls.
///
/// Implementations must run every call exactly once, never inline with
/// `schedule`, and not before `delay` has elapsed. Calls handed over by one
/// `schedule` sequence with the same delay keep their order.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, call: DeferredCall, delay: Duration);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, call: DeferredCall, delay: Duration) {
        (**self).schedule(call, delay)
    }
}
