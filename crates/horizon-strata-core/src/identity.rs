//! Identity and content-equality contract for renderable components.
//!
//! Every unit the reconciler diffs exposes two things:
//!
//! - a stable identifier ([`Identifiable::id`]) that names the *same logical
//!   item* across renders, and
//! - a content comparison ([`Identifiable::should_content_update`]) that says
//!   whether painting the next value would differ from painting this one.
//!
//! Two values with equal ids are the same item even when their content
//! differs. Two values with equal ids whose content comparison returns `false`
//! are visually identical and are never repainted.
//!
//! # Contract
//!
//! - `id` must be stable for the same logical item and unique among its
//!   siblings (the section list, or the cells of one section).
//! - `should_content_update` must be reflexive-false:
//!   `a.should_content_update(&a) == false`.
//! - A false positive costs one extra repaint. A false negative is a missed
//!   repaint and therefore a bug.
//!
//! # Example
//!
//! ```
//! use horizon_strata_core::{ComponentId, Identifiable};
//!
//! #[derive(Clone, PartialEq)]
//! struct Label {
//!     key: u32,
//!     text: String,
//! }
//!
//! impl Identifiable for Label {
//!     type Id = u32;
//!
//!     fn id(&self) -> u32 {
//!         self.key
//!     }
//!
//!     fn should_content_update(&self, next: &Self) -> bool {
//!         self.text != next.text
//!     }
//! }
//!
//! let a = Label { key: 1, text: "one".into() };
//! let b = Label { key: 1, text: "uno".into() };
//! assert_eq!(ComponentId::of(&a), ComponentId::of(&b));
//! assert!(a.should_content_update(&b));
//! assert!(!a.should_content_update(&a));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value that can be uniquely identified and compared for visual changes.
///
/// Implement this by hand, or use `#[derive(Identifiable)]` from
/// `horizon-strata-macros`, which builds the id from fields marked `#[id]` and
/// compares every other field with `!=`.
pub trait Identifiable {
    /// The identifier type.
    type Id: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static;

    /// Returns the identifier of this value.
    fn id(&self) -> Self::Id;

    /// Returns `true` if `next` would paint differently than `self`.
    ///
    /// Unlike `PartialEq` this may ignore fields that never reach the screen.
    fn should_content_update(&self, next: &Self) -> bool;
}

/// Object-safe view over an identifier of any concrete type.
trait ErasedId: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn ErasedId) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> ErasedId for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ErasedId) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type-erased component identifier.
///
/// `ComponentId` lets sections hold cells of different concrete types while
/// still keying them by identity. Ids wrapping different concrete types never
/// compare equal, even when their values would (e.g. `1u32` and `1u64`).
///
/// Cloning is cheap (reference counted).
#[derive(Clone)]
pub struct ComponentId(Arc<dyn ErasedId>);

impl ComponentId {
    /// Wraps any hashable value as an identifier.
    pub fn new<T>(value: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// Returns the erased identifier of an [`Identifiable`] value.
    pub fn of<I: Identifiable + ?Sized>(value: &I) -> Self {
        Self::new(value.id())
    }

    /// Returns the wrapped value if it is of type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Returns `true` if this id wraps a value of type `T` equal to `value`.
    pub fn is<T: PartialEq + 'static>(&self, value: &T) -> bool {
        self.downcast_ref::<T>().is_some_and(|v| v == value)
    }

    /// Returns the `TypeId` of the wrapped value.
    pub fn value_type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(&*other.0)
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type_id().hash(state);
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.dyn_fmt(f)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.dyn_fmt(f)
    }
}

static_assertions::assert_impl_all!(ComponentId: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Clone, PartialEq)]
    struct Row {
        key: &'static str,
        value: i32,
    }

    impl Identifiable for Row {
        type Id = &'static str;

        fn id(&self) -> Self::Id {
            self.key
        }

        fn should_content_update(&self, next: &Self) -> bool {
            self.value != next.value
        }
    }

    #[test]
    fn test_same_type_equality() {
        assert_eq!(ComponentId::new("a"), ComponentId::new("a"));
        assert_ne!(ComponentId::new("a"), ComponentId::new("b"));
    }

    #[test]
    fn test_different_types_never_equal() {
        assert_ne!(ComponentId::new(1u32), ComponentId::new(1u64));
        assert_ne!(ComponentId::new(1i32), ComponentId::new("1"));
    }

    #[test]
    fn test_hash_map_key() {
        let mut map = HashMap::new();
        map.insert(ComponentId::new(7u8), "seven");
        map.insert(ComponentId::new("seven"), "str");

        assert_eq!(map.get(&ComponentId::new(7u8)), Some(&"seven"));
        assert_eq!(map.get(&ComponentId::new("seven")), Some(&"str"));
        assert_eq!(map.get(&ComponentId::new(7u16)), None);
    }

    #[test]
    fn test_downcast() {
        let id = ComponentId::new(String::from("row"));
        assert_eq!(id.downcast_ref::<String>().map(String::as_str), Some("row"));
        assert!(id.downcast_ref::<&str>().is_none());
        assert!(id.is(&String::from("row")));
    }

    #[test]
    fn test_debug_forwards_inner() {
        assert_eq!(format!("{:?}", ComponentId::new("x")), "\"x\"");
        assert_eq!(format!("{}", ComponentId::new(3)), "3");
    }

    #[test]
    fn test_identifiable_contract() {
        let a = Row { key: "a", value: 1 };
        let a2 = Row { key: "a", value: 2 };

        assert_eq!(ComponentId::of(&a), ComponentId::of(&a2));
        assert!(!a.should_content_update(&a));
        assert!(a.should_content_update(&a2));
    }
}
