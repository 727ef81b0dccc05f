use crate::callback::Callback;
use crate::event::{downcast_ancestor, EventArgs, Reflect, Sender};
use crate::scheduler::DeferredCall;
use std::fmt;
use std::sync::Arc;

/// Stable numeric identity of a registration.
///
/// Minted by the registry starting at 1 and never reused. Zero is
/// [`ListenerId::INVALID`] and is rejected by id-based operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

impl ListenerId {
    pub const INVALID: ListenerId = ListenerId(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<ListenerId> for u32 {
    fn from(id: ListenerId) -> Self {
        id.0
    }
}

/// One registration inside a listener set.
pub(crate) struct ListenerEntry<T: EventArgs> {
    id: ListenerId,
    callback: Callback<T>,
    pending_removal: bool,
}

impl<T: EventArgs> ListenerEntry<T> {
    pub(crate) fn new(id: ListenerId, callback: Callback<T>) -> Self {
        Self {
            id,
            callback,
            pending_removal: false,
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn callback(&self) -> &Callback<T> {
        &self.callback
    }

    pub(crate) fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    /// One-way: an entry is never revived once marked.
    pub(crate) fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    /// Captures the callback, sender and event into a call that can run later.
    pub(crate) fn deferred(
        &self,
        sender: Option<&Sender>,
        event: &Arc<dyn EventArgs>,
    ) -> DeferredCall {
        let id = self.id;
        let callback = self.callback.clone();
        let sender = sender.cloned();
        let event = Arc::clone(event);

        Box::new(move || {
            let root: &dyn EventArgs = &*event;
            if let Some(args) = downcast_ancestor::<T>(root) {
                tracing::trace!(
                    listener = %id,
                    event_type = %root.event_type(),
                    "invoking listener"
                );
                callback.invoke(sender.as_ref(), args);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping {
        value: usize,
    }
    crate::event_args!(Ping);

    #[test]
    fn test_listener_id_validity() {
        assert!(!ListenerId::INVALID.is_valid());
        assert!(ListenerId::from_raw(1).is_valid());
        assert_eq!(ListenerId::from_raw(9).get(), 9);
        assert_eq!(ListenerId::from_raw(3).to_string(), "#3");
    }

    #[test]
    fn test_entry_removal_flag() {
        let callback = Callback::new(|_, _: &Ping| {});
        let mut entry = ListenerEntry::new(ListenerId::from_raw(1), callback);
        assert!(!entry.is_pending_removal());
        entry.mark_for_removal();
        assert!(entry.is_pending_removal());
    }

    #[test]
    fn test_deferred_call_runs_only_when_invoked() {
        let total = Arc::new(AtomicUsize::new(0));
        let seen = total.clone();
        let entry = ListenerEntry::new(
            ListenerId::from_raw(1),
            Callback::new(move |_, ping: &Ping| {
                seen.fetch_add(ping.value, Ordering::SeqCst);
            }),
        );

        let event: Arc<dyn EventArgs> = Arc::new(Ping { value: 3 });
        let call = entry.deferred(None, &event);
        assert_eq!(total.load(Ordering::SeqCst), 0);

        call();
        assert_eq!(total.load(Ordering::SeqCst), 3);
    }
}
