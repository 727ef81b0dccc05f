use crate::event::{EventArgs, Sender};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

type Handler<T> = dyn Fn(Option<&Sender>, &T) + Send + Sync;

/// A listener function for events of type `T`.
///
/// Identity follows the allocation: clones of one `Callback` compare equal
/// and can be used to remove or query the registration, while two callbacks
/// built from identical closures are distinct listeners.
pub struct Callback<T: EventArgs> {
    handler: Arc<Handler<T>>,
}

impl<T: EventArgs> Callback<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Option<&Sender>, &T) + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn invoke(&self, sender: Option<&Sender>, args: &T) {
        (self.handler)(sender, args)
    }

    pub(crate) fn key(&self) -> CallbackKey {
        CallbackKey(Arc::as_ptr(&self.handler) as *const () as usize)
    }
}

impl<T: EventArgs> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T: EventArgs> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T: EventArgs> Eq for Callback<T> {}

impl<T: EventArgs> Hash for Callback<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<T: EventArgs> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("event_type", &std::any::type_name::<T>())
            .field("key", &self.key().0)
            .finish()
    }
}

/// Address of a callback allocation, used as the reverse-index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CallbackKey(usize);
