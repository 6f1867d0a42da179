//! Kind-typed indices into a resource store

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Index into a [`Store`](super::Store) of `K` values.
///
/// A handle is either valid (points at an entry minted by the store) or
/// invalid. Handles of different kinds never compare or convert into each
/// other even though every one of them wraps a plain integer.
pub struct Handle<K> {
    idx: u32,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    const INVALID_IDX: u32 = u32::MAX;

    /// The invalid handle (no entry)
    pub const INVALID: Handle<K> = Handle {
        idx: Self::INVALID_IDX,
        _kind: PhantomData,
    };

    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < Self::INVALID_IDX as usize);
        Self {
            idx: idx as u32,
            _kind: PhantomData,
        }
    }

    /// Build a handle from a raw 0-based index, e.g. one read out of a mesh file.
    /// The store still checks it on every lookup.
    pub fn from_index(idx: usize) -> Self {
        if idx >= Self::INVALID_IDX as usize {
            Self::INVALID
        } else {
            Self::new(idx)
        }
    }

    pub fn is_valid(self) -> bool {
        self.idx != Self::INVALID_IDX
    }

    /// Raw index, `None` for the invalid handle
    pub fn index(self) -> Option<usize> {
        self.is_valid().then_some(self.idx as usize)
    }

    pub fn reset(&mut self) {
        self.idx = Self::INVALID_IDX;
    }
}

// Manual impls: derives would put bounds on `K`, which is only a marker.

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl<K> Eq for Handle<K> {}

impl<K> PartialOrd for Handle<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Handle<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.idx.cmp(&other.idx)
    }
}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idx.hash(state);
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = std::any::type_name::<K>().rsplit("::").next().unwrap_or("?");
        match self.index() {
            Some(idx) => write!(f, "Handle<{}>({})", kind, idx),
            None => write!(f, "Handle<{}>(invalid)", kind),
        }
    }
}
