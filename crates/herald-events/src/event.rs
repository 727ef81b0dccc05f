//! Event-data types and their ancestor chains.
//!
//! Every broadcastable payload implements [`EventArgs`]. A type names its
//! parent by handing out a view of the parent value it embeds, which gives
//! the dispatcher an explicit chain to walk from the concrete type up to the
//! root:
//!
//! ```
//! use herald_events::{downcast_ancestor, event_args, EventArgs};
//!
//! struct Base { code: u32 }
//! struct Leaf { base: Base, detail: String }
//!
//! event_args!(Base);
//! event_args!(Leaf => base);
//!
//! let leaf = Leaf { base: Base { code: 7 }, detail: "x".into() };
//! let base: &Base = downcast_ancestor(&leaf).unwrap();
//! assert_eq!(base.code, 7);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The source of a dispatch, handed to every listener untouched.
pub type Sender = Arc<dyn Any + Send + Sync>;

/// Classification tag of an event-data type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl std::hash::Hash for EventType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Runtime type access for event payloads. Implemented for every `'static`
/// type; only reachable through [`EventArgs`].
pub trait Reflect: Any {
    fn as_any(&self) -> &dyn Any;
    fn event_type(&self) -> EventType;
}

impl<T: Any> Reflect for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_type(&self) -> EventType {
        EventType::of::<T>()
    }
}

/// Event data that can be dispatched.
///
/// `parent` returns the embedded value of the next type up the chain, or
/// `None` for a root type. Listeners registered on any type in the chain
/// observe the event. Prefer [`event_args!`](crate::event_args) over a
/// hand-written impl.
pub trait EventArgs: Reflect + Send + Sync {
    fn parent(&self) -> Option<&dyn EventArgs> {
        None
    }
}

/// Finds the view of `event` typed as `T`, searching the event itself and
/// then each ancestor. `None` means the event is not a `T`.
pub fn downcast_ancestor<T: EventArgs>(event: &dyn EventArgs) -> Option<&T> {
    let mut level = Some(event);
    while let Some(current) = level {
        if let Some(found) = current.as_any().downcast_ref::<T>() {
            return Some(found);
        }
        level = current.parent();
    }
    None
}

/// Ancestor chain of `event`, most specific first.
pub fn ancestry(event: &dyn EventArgs) -> Vec<EventType> {
    let mut chain = Vec::new();
    let mut level = Some(event);
    while let Some(current) = level {
        chain.push(current.event_type());
        level = current.parent();
    }
    chain
}

/// Implements [`EventArgs`] for a root type, or for a child type whose
/// parent value lives in the named field.
#[macro_export]
macro_rules! event_args {
    ($ty:ty) => {
        impl $crate::EventArgs for $ty {}
    };
    ($ty:ty => $field:ident) => {
        impl $crate::EventArgs for $ty {
            fn parent(&self) -> ::core::option::Option<&dyn $crate::EventArgs> {
                ::core::option::Option::Some(&self.$field as &dyn $crate::EventArgs)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base {
        code: u32,
    }

    struct Middle {
        base: Base,
        tag: &'static str,
    }

    struct Leaf {
        middle: Middle,
    }

    struct Unrelated;

    event_args!(Base);
    event_args!(Middle => base);
    event_args!(Leaf => middle);
    event_args!(Unrelated);

    fn leaf() -> Leaf {
        Leaf {
            middle: Middle {
                base: Base { code: 42 },
                tag: "mid",
            },
        }
    }

    #[test]
    fn test_event_type_equality() {
        assert_eq!(EventType::of::<Base>(), EventType::of::<Base>());
        assert_ne!(EventType::of::<Base>(), EventType::of::<Leaf>());
        assert!(EventType::of::<Leaf>().name().ends_with("Leaf"));
    }

    #[test]
    fn test_runtime_type_through_trait_object() {
        let event = leaf();
        let erased: &dyn EventArgs = &event;
        assert_eq!(erased.event_type(), EventType::of::<Leaf>());
    }

    #[test]
    fn test_downcast_ancestor_walks_chain() {
        let event = leaf();
        assert!(downcast_ancestor::<Leaf>(&event).is_some());
        assert_eq!(downcast_ancestor::<Middle>(&event).unwrap().tag, "mid");
        assert_eq!(downcast_ancestor::<Base>(&event).unwrap().code, 42);
        assert!(downcast_ancestor::<Unrelated>(&event).is_none());
    }

    #[test]
    fn test_downcast_ancestor_does_not_walk_down() {
        let base = Base { code: 1 };
        assert!(downcast_ancestor::<Leaf>(&base).is_none());
    }

    #[test]
    fn test_ancestry_order() {
        let chain = ancestry(&leaf());
        assert_eq!(
            chain,
            vec![
                EventType::of::<Leaf>(),
                EventType::of::<Middle>(),
                EventType::of::<Base>(),
            ]
        );
        assert_eq!(ancestry(&Unrelated), vec![EventType::of::<Unrelated>()]);
    }
}
