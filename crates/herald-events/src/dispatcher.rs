use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::callback::Callback;
use crate::error::{DispatchError, Result};
use crate::event::{EventArgs, Reflect, Sender};
use crate::listener::ListenerId;
use crate::registry::Registry;
use crate::scheduler::{DeferredCall, Scheduler};

/// Registry plus scheduler: the entry point for adding listeners and
/// broadcasting events.
///
/// One lock guards the registry. It is held while listeners are added or
/// removed and while invocation batches are produced, never while listeners
/// run, so a listener may call back into the dispatcher freely.
pub struct Dispatcher {
    registry: Mutex<Registry>,
    scheduler: Arc<dyn Scheduler>,
    default_delay: Duration,
}

impl Dispatcher {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::builder(scheduler).build()
    }

    pub fn builder(scheduler: Arc<dyn Scheduler>) -> DispatcherBuilder {
        DispatcherBuilder {
            scheduler,
            default_delay: Duration::ZERO,
        }
    }

    /// Delay applied by [`dispatch`](Self::dispatch).
    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    pub fn add_listener<T: EventArgs>(&self, callback: &Callback<T>) -> Result<ListenerId> {
        self.registry.lock().add_listener(callback)
    }

    pub fn remove_listener<T: EventArgs>(&self, callback: &Callback<T>) -> bool {
        self.registry.lock().remove_listener(callback)
    }

    /// Fails with [`DispatchError::InvalidListenerId`] for the zero id;
    /// otherwise `Ok(false)` when nothing was registered under `id`.
    pub fn remove_listener_by_id(&self, id: ListenerId) -> Result<bool> {
        ensure_valid(id)?;
        Ok(self.registry.lock().remove_listener_by_id(id))
    }

    pub fn contains_listener<T: EventArgs>(&self, callback: &Callback<T>) -> bool {
        self.registry.lock().contains_listener(callback)
    }

    pub fn contains_listener_by_id(&self, id: ListenerId) -> Result<bool> {
        ensure_valid(id)?;
        Ok(self.registry.lock().contains_listener_by_id(id))
    }

    pub fn listener_count<T: EventArgs>(&self) -> usize {
        self.registry.lock().listener_count::<T>()
    }

    pub fn clear(&self) {
        self.registry.lock().clear();
    }

    pub fn clear_type<T: EventArgs>(&self) {
        self.registry.lock().clear_type::<T>();
    }

    pub fn dispatch<E: EventArgs>(&self, event: E) -> usize {
        self.dispatch_from(None, event, self.default_delay)
    }

    pub fn dispatch_delayed<E: EventArgs>(&self, event: E, delay: Duration) -> usize {
        self.dispatch_from(None, event, delay)
    }

    pub fn dispatch_from<E: EventArgs>(
        &self,
        sender: Option<Sender>,
        event: E,
        delay: Duration,
    ) -> usize {
        self.dispatch_shared(sender, Arc::new(event), delay)
    }

    /// Schedules one deferred call per listener registered on the event's
    /// runtime type or any of its ancestors, most specific type first.
    /// Returns the number of calls handed to the scheduler; none of them
    /// has run when this returns.
    pub fn dispatch_shared(
        &self,
        sender: Option<Sender>,
        event: Arc<dyn EventArgs>,
        delay: Duration,
    ) -> usize {
        let calls = self.collect_calls(sender.as_ref(), &event);
        let scheduled = calls.len();
        for call in calls {
            self.scheduler.schedule(call, delay);
        }

        tracing::debug!(
            event_type = %event.as_ref().event_type(),
            scheduled,
            ?delay,
            "event dispatched"
        );
        scheduled
    }

    fn collect_calls(
        &self,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> Vec<DeferredCall> {
        let mut registry = self.registry.lock();
        let mut calls = Vec::new();
        let mut level: Option<&dyn EventArgs> = Some(event.as_ref());

        while let Some(current) = level {
            if let Some(batch) = registry.invocation_batch(current.event_type(), sender, event) {
                calls.extend(batch);
            }
            level = current.parent();
        }
        calls
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.registry.lock().len())
            .field("default_delay", &self.default_delay)
            .finish()
    }
}

pub struct DispatcherBuilder {
    scheduler: Arc<dyn Scheduler>,
    default_delay: Duration,
}

impl DispatcherBuilder {
    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: Mutex::new(Registry::new()),
            scheduler: self.scheduler,
            default_delay: self.default_delay,
        }
    }
}

/// Lets an event dispatch itself through a given dispatcher.
pub trait EventArgsExt: EventArgs + Sized {
    fn dispatch_on(self, dispatcher: &Dispatcher) -> usize {
        dispatcher.dispatch(self)
    }

    fn dispatch_on_from(self, dispatcher: &Dispatcher, sender: Sender) -> usize {
        dispatcher.dispatch_from(Some(sender), self, dispatcher.default_delay())
    }
}

impl<E: EventArgs> EventArgsExt for E {}

fn ensure_valid(id: ListenerId) -> Result<()> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(DispatchError::InvalidListenerId)
    }
}
