use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::callback::Callback;
use crate::error::{DispatchError, Result};
use crate::event::{EventArgs, EventType, Sender};
use crate::listener::ListenerId;
use crate::scheduler::DeferredCall;
use crate::set::{ErasedListenerSet, ListenerSet};

/// Owns one listener set per concrete event type and the global
/// id-to-set index used for removal without knowing the type.
///
/// Not synchronized; [`Dispatcher`](crate::Dispatcher) wraps it in a lock.
pub struct Registry {
    sets: HashMap<TypeId, Box<dyn ErasedListenerSet>>,
    owners: HashMap<ListenerId, TypeId>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
            owners: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn add_listener<T: EventArgs>(&mut self, callback: &Callback<T>) -> Result<ListenerId> {
        // wraps to zero once every u32 id has been handed out
        if self.next_id == 0 {
            return Err(DispatchError::IdsExhausted);
        }

        let id = ListenerId::from_raw(self.next_id);
        let event_type = EventType::of::<T>();
        let set = self
            .sets
            .entry(event_type.id())
            .or_insert_with(|| Box::new(ListenerSet::<T>::new()) as Box<dyn ErasedListenerSet>)
            .as_any_mut()
            .downcast_mut::<ListenerSet<T>>()
            .ok_or(DispatchError::SetTypeMismatch {
                event_type: event_type.name(),
            })?;

        set.add(id, callback.clone())?;
        self.owners.insert(id, event_type.id());
        self.next_id = self.next_id.wrapping_add(1);

        tracing::debug!(listener = %id, %event_type, "listener added");
        Ok(id)
    }

    pub fn remove_listener<T: EventArgs>(&mut self, callback: &Callback<T>) -> bool {
        let Some(set) = self.typed_set_mut::<T>() else {
            return false;
        };
        let Some(id) = set.remove_callback(callback) else {
            return false;
        };

        self.owners.remove(&id);
        tracing::debug!(listener = %id, event_type = %EventType::of::<T>(), "listener removed");
        true
    }

    pub fn remove_listener_by_id(&mut self, id: ListenerId) -> bool {
        let Some(type_id) = self.owners.get(&id) else {
            return false;
        };
        let Some(set) = self.sets.get_mut(type_id) else {
            return false;
        };
        if set.remove(id).is_none() {
            return false;
        }

        self.owners.remove(&id);
        tracing::debug!(listener = %id, "listener removed by id");
        true
    }

    pub fn contains_listener<T: EventArgs>(&self, callback: &Callback<T>) -> bool {
        self.typed_set::<T>()
            .is_some_and(|set| set.contains_callback(callback))
    }

    pub fn contains_listener_by_id(&self, id: ListenerId) -> bool {
        self.owners
            .get(&id)
            .and_then(|type_id| self.sets.get(type_id))
            .is_some_and(|set| set.contains(id))
    }

    /// Live listeners registered for exactly `T` (ancestors not included).
    pub fn listener_count<T: EventArgs>(&self) -> usize {
        self.sets
            .get(&TypeId::of::<T>())
            .map_or(0, |set| set.len())
    }

    /// Ids registered for exactly `T`, in registration order.
    pub fn listener_ids<T: EventArgs>(&self) -> Vec<ListenerId> {
        self.sets
            .get(&TypeId::of::<T>())
            .map(|set| set.ids())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn clear(&mut self) {
        self.sets.clear();
        self.owners.clear();
        tracing::debug!("all listeners cleared");
    }

    pub fn clear_type<T: EventArgs>(&mut self) {
        let Some(set) = self.sets.get_mut(&TypeId::of::<T>()) else {
            return;
        };

        for id in set.ids() {
            self.owners.remove(&id);
        }
        set.clear();
        tracing::debug!(event_type = %set.event_type(), "listeners cleared");
    }

    /// Produces the invocation batch of the set registered for exactly
    /// `event_type`, or `None` if there is no such set or it does not apply.
    pub(crate) fn invocation_batch(
        &mut self,
        event_type: EventType,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> Option<Vec<DeferredCall>> {
        self.sets
            .get_mut(&event_type.id())?
            .invocation_batch(sender, event)
    }

    fn typed_set<T: EventArgs>(&self) -> Option<&ListenerSet<T>> {
        self.sets
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ListenerSet<T>>()
    }

    fn typed_set_mut<T: EventArgs>(&mut self) -> Option<&mut ListenerSet<T>> {
        self.sets
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ListenerSet<T>>()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
