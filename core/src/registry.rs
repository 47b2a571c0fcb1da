//! UID-keyed object registry.
//!
//! A [`Registry<T>`] owns boxed values and hands out typed [`Uid<T>`] handles.
//! Everything else in a document refers to registered objects by handle,
//! never by reference, so that ownership stays with the registry and
//! lifetime decisions (unmanage, destroy) are explicit.
//!
//! # Identity
//!
//! UIDs come from a monotonic counter. A UID is never handed out twice by
//! the same registry, even after the object it named has been unmanaged.
//! Objects whose identity is carried in from outside (e.g. a deserialized
//! document) are registered with [`Registry::manage_with_uid`], which moves
//! the counter past the supplied value.
//!
//! # Example
//!
//! ```
//! use talkbook_core::registry::Registry;
//!
//! let mut names = Registry::<String>::new();
//! let a = names.manage(Box::new("intro".to_owned()));
//! let b = names.manage(Box::new("chapter 1".to_owned()));
//! assert_ne!(a, b);
//!
//! names.unmanage(a).unwrap();
//! let c = names.manage(Box::new("chapter 2".to_owned()));
//! assert_ne!(a, c); // never reused
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors raised by [`Registry`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The UID is already bound to a live object.
    #[error("uid {0} is already managed")]
    AlreadyManaged(u64),
    /// The UID is not bound to any object.
    #[error("uid {0} is not managed")]
    NotManaged(u64),
    /// Registering the UID would leave no room for the counter.
    #[error("uid {0} is beyond the assignable range")]
    OutOfRange(u64),
}

/// Largest UID [`Registry::manage_with_uid`] accepts.
///
/// The upper half of the UID space stays free for registry-assigned UIDs, so
/// the counter cannot overflow.
pub const MAX_UID: u64 = u64::MAX >> 1;

/// A typed handle into a [`Registry<T>`].
///
/// The type parameter only tags the handle; two UIDs of different tag types
/// cannot be mixed up at compile time. Serializes as the bare integer.
pub struct Uid<T: ?Sized> {
    value: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Uid<T> {
    /// Wraps a raw value. Used when identity comes from outside the registry.
    pub const fn from_raw(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Returns the raw integer value.
    pub const fn raw(self) -> u64 {
        self.value
    }
}

impl<T: ?Sized> Clone for Uid<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Uid<T> {}

impl<T: ?Sized> PartialEq for Uid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: ?Sized> Eq for Uid<T> {}

impl<T: ?Sized> PartialOrd for Uid<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Uid<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: ?Sized> Hash for Uid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Uid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.value)
    }
}

impl<T: ?Sized> fmt::Display for Uid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T: ?Sized> Serialize for Uid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl<'de, T: ?Sized> Deserialize<'de> for Uid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_raw)
    }
}

/// Owns boxed values keyed by [`Uid<T>`].
///
/// Iteration is in ascending UID order, i.e. registration order for
/// registry-assigned UIDs.
pub struct Registry<T: ?Sized> {
    entries: BTreeMap<Uid<T>, Box<T>>,
    next_uid: u64,
}

impl<T: ?Sized> Registry<T> {
    /// Creates an empty registry. The first UID handed out is `1`.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_uid: 1,
        }
    }

    /// Takes ownership of `value` and returns its fresh UID.
    pub fn manage(&mut self, value: Box<T>) -> Uid<T> {
        let uid = Uid::from_raw(self.next_uid);
        self.next_uid += 1;
        self.entries.insert(uid, value);
        uid
    }

    /// Takes ownership of `value` under a caller-supplied UID.
    ///
    /// Fails with [`RegistryError::AlreadyManaged`] if the UID is bound and
    /// with [`RegistryError::OutOfRange`] above [`MAX_UID`].
    /// Later registry-assigned UIDs will be greater than `uid`.
    pub fn manage_with_uid(&mut self, uid: Uid<T>, value: Box<T>) -> Result<(), RegistryError> {
        if uid.raw() > MAX_UID {
            return Err(RegistryError::OutOfRange(uid.raw()));
        }
        if self.entries.contains_key(&uid) {
            return Err(RegistryError::AlreadyManaged(uid.raw()));
        }
        self.entries.insert(uid, value);
        self.next_uid = self.next_uid.max(uid.raw() + 1);
        Ok(())
    }

    /// Releases the mapping for `uid` and hands the value back to the caller.
    pub fn unmanage(&mut self, uid: Uid<T>) -> Result<Box<T>, RegistryError> {
        self.entries
            .remove(&uid)
            .ok_or(RegistryError::NotManaged(uid.raw()))
    }

    /// Returns the value bound to `uid`, if any.
    pub fn get(&self, uid: Uid<T>) -> Option<&T> {
        self.entries.get(&uid).map(|b| b.as_ref())
    }

    /// Returns the value bound to `uid` mutably, if any.
    pub fn get_mut(&mut self, uid: Uid<T>) -> Option<&mut T> {
        self.entries.get_mut(&uid).map(|b| b.as_mut())
    }

    /// Returns `true` if `uid` is bound.
    pub fn contains(&self, uid: Uid<T>) -> bool {
        self.entries.contains_key(&uid)
    }

    /// Iterates over bound UIDs in ascending order.
    pub fn uids(&self) -> impl Iterator<Item = Uid<T>> + '_ {
        self.entries.keys().copied()
    }

    /// Iterates over `(uid, value)` pairs in ascending UID order.
    pub fn iter(&self) -> impl Iterator<Item = (Uid<T>, &T)> {
        self.entries.iter().map(|(uid, value)| (*uid, value.as_ref()))
    }

    /// Iterates mutably over `(uid, value)` pairs in ascending UID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Uid<T>, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(uid, value)| (*uid, value.as_mut()))
    }

    /// Number of bound UIDs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The UID the next call to [`manage`](Self::manage) will return.
    pub fn peek_next_uid(&self) -> Uid<T> {
        Uid::from_raw(self.next_uid)
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.entries.len())
            .field("next_uid", &self.next_uid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn manage_assigns_increasing_uids() {
        let mut registry = Registry::<u32>::new();
        let a = registry.manage(Box::new(10));
        let b = registry.manage(Box::new(20));
        assert!(a < b);
        assert_eq!(registry.get(a), Some(&10));
        assert_eq!(registry.get(b), Some(&20));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unmanage_returns_value() {
        let mut registry = Registry::<u32>::new();
        let a = registry.manage(Box::new(10));
        assert_eq!(*registry.unmanage(a).unwrap(), 10);
        assert!(!registry.contains(a));
        assert!(registry.is_empty());
    }

    #[test]
    fn unmanage_unknown_fails() {
        let mut registry = Registry::<u32>::new();
        let result = registry.unmanage(Uid::from_raw(42));
        assert_eq!(result.unwrap_err(), RegistryError::NotManaged(42));
    }

    #[test]
    fn uids_never_reused_after_unmanage() {
        let mut registry = Registry::<u32>::new();
        let mut seen = HashSet::new();
        for round in 0..50 {
            let uid = registry.manage(Box::new(round));
            assert!(seen.insert(uid), "uid {uid} handed out twice");
            if round % 2 == 0 {
                registry.unmanage(uid).unwrap();
            }
        }
        assert_eq!(registry.len(), 25);
    }

    #[test]
    fn manage_with_uid_advances_counter() {
        let mut registry = Registry::<u32>::new();
        registry.manage_with_uid(Uid::from_raw(7), Box::new(1)).unwrap();
        let next = registry.manage(Box::new(2));
        assert_eq!(next.raw(), 8);
    }

    #[test]
    fn manage_with_uid_below_counter_keeps_counter() {
        let mut registry = Registry::<u32>::new();
        let a = registry.manage(Box::new(1));
        let b = registry.manage(Box::new(2));
        registry.unmanage(a).unwrap();
        registry.manage_with_uid(a, Box::new(3)).unwrap();
        let c = registry.manage(Box::new(4));
        assert!(c > b);
    }

    #[test]
    fn manage_with_taken_uid_fails() {
        let mut registry = Registry::<u32>::new();
        let a = registry.manage(Box::new(1));
        let err = registry.manage_with_uid(a, Box::new(2)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyManaged(a.raw()));
        assert_eq!(registry.get(a), Some(&1));
    }

    #[test]
    fn manage_with_uid_at_top_of_range() {
        let mut registry = Registry::<u32>::new();
        assert_eq!(
            registry.manage_with_uid(Uid::from_raw(MAX_UID + 1), Box::new(1)),
            Err(RegistryError::OutOfRange(MAX_UID + 1))
        );
        assert!(registry.is_empty());

        registry.manage_with_uid(Uid::from_raw(MAX_UID), Box::new(2)).unwrap();
        assert_eq!(registry.manage(Box::new(3)).raw(), MAX_UID + 1);
    }

    #[test]
    fn iteration_is_ordered() {
        let mut registry = Registry::<u32>::new();
        registry.manage_with_uid(Uid::from_raw(5), Box::new(5)).unwrap();
        registry.manage_with_uid(Uid::from_raw(2), Box::new(2)).unwrap();
        registry.manage(Box::new(6));
        let values: Vec<u32> = registry.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2, 5, 6]);
    }

    #[test]
    fn unsized_values() {
        trait Named {
            fn name(&self) -> &str;
        }
        struct Clip;
        impl Named for Clip {
            fn name(&self) -> &str {
                "clip"
            }
        }

        let mut registry = Registry::<dyn Named>::new();
        let uid = registry.manage(Box::new(Clip));
        assert_eq!(registry.get(uid).unwrap().name(), "clip");
    }

    #[test]
    fn peek_next_uid() {
        let mut registry = Registry::<u32>::new();
        let peeked = registry.peek_next_uid();
        assert_eq!(registry.manage(Box::new(0)), peeked);
    }

    #[test]
    fn uid_display_and_debug() {
        let uid = Uid::<u32>::from_raw(3);
        assert_eq!(uid.to_string(), "3");
        assert_eq!(format!("{uid:?}"), "Uid(3)");
    }
}
