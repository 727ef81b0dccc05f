//! Per-type listener storage.
//!
//! A [`ListenerSet`] keeps its entries in insertion order inside an
//! `IndexMap` keyed by listener id, next to a reverse index from callback to
//! id. Removal only flags the entry and drops its index entry; the slot is
//! physically purged the next time an invocation batch is produced, so a
//! batch being built never observes storage shifting underneath it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::callback::{Callback, CallbackKey};
use crate::error::{DispatchError, Result};
use crate::event::{downcast_ancestor, EventArgs, EventType, Sender};
use crate::listener::{ListenerEntry, ListenerId};
use crate::scheduler::DeferredCall;

pub(crate) struct ListenerSet<T: EventArgs> {
    entries: IndexMap<ListenerId, ListenerEntry<T>>,
    by_callback: HashMap<CallbackKey, ListenerId>,
    count: usize,
}

impl<T: EventArgs> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            by_callback: HashMap::new(),
            count: 0,
        }
    }

    pub(crate) fn add(&mut self, id: ListenerId, callback: Callback<T>) -> Result<()> {
        if self.contains_callback(&callback) {
            return Err(DispatchError::DuplicateCallback {
                event_type: std::any::type_name::<T>(),
            });
        }
        // A flagged slot still occupies storage until the next purge.
        if self.entries.contains_key(&id) {
            return Err(DispatchError::DuplicateId {
                id,
                event_type: std::any::type_name::<T>(),
            });
        }

        self.by_callback.insert(callback.key(), id);
        self.entries.insert(id, ListenerEntry::new(id, callback));
        self.count += 1;
        Ok(())
    }

    pub(crate) fn remove_callback(&mut self, callback: &Callback<T>) -> Option<ListenerId> {
        let id = *self.by_callback.get(&callback.key())?;
        self.remove(id)
    }

    pub(crate) fn contains_callback(&self, callback: &Callback<T>) -> bool {
        self.by_callback.contains_key(&callback.key())
    }

    fn remove(&mut self, id: ListenerId) -> Option<ListenerId> {
        let entry = self.entries.get_mut(&id)?;
        if entry.is_pending_removal() {
            return None;
        }

        entry.mark_for_removal();
        self.by_callback.remove(&entry.callback().key());
        self.count -= 1;
        Some(id)
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| !entry.is_pending_removal())
    }

    fn ids(&self) -> Vec<ListenerId> {
        self.entries
            .values()
            .filter(|entry| !entry.is_pending_removal())
            .map(ListenerEntry::id)
            .collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_callback.clear();
        self.count = 0;
    }

    /// Purges flagged entries and snapshots every live one into a deferred
    /// call, in insertion order. `None` if `event` is not a `T`.
    fn invocation_batch(
        &mut self,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> Option<Vec<DeferredCall>> {
        downcast_ancestor::<T>(&**event)?;

        let mut batch = Vec::with_capacity(self.count);
        self.entries.retain(|_, entry| {
            if entry.is_pending_removal() {
                return false;
            }
            batch.push(entry.deferred(sender, event));
            true
        });
        Some(batch)
    }
}

/// Object-safe view of a [`ListenerSet`] so the registry can hold sets of
/// every event type in one map.
pub(crate) trait ErasedListenerSet: Send {
    fn event_type(&self) -> EventType;

    fn len(&self) -> usize;

    fn remove(&mut self, id: ListenerId) -> Option<ListenerId>;

    fn contains(&self, id: ListenerId) -> bool;

    fn ids(&self) -> Vec<ListenerId>;

    fn clear(&mut self);

    fn invocation_batch(
        &mut self,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> Option<Vec<DeferredCall>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: EventArgs> ErasedListenerSet for ListenerSet<T> {
    fn event_type(&self) -> EventType {
        EventType::of::<T>()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn remove(&mut self, id: ListenerId) -> Option<ListenerId> {
        ListenerSet::remove(self, id)
    }

    fn contains(&self, id: ListenerId) -> bool {
        ListenerSet::contains(self, id)
    }

    fn ids(&self) -> Vec<ListenerId> {
        ListenerSet::ids(self)
    }

    fn clear(&mut self) {
        ListenerSet::clear(self)
    }

    fn invocation_batch(
        &mut self,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> Option<Vec<DeferredCall>> {
        ListenerSet::invocation_batch(self, sender, event)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
