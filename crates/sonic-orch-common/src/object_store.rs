//! Handle-keyed ordered object store.
//!
//! `ObjectStore` is the per-entity index of the QoS graph. It never creates
//! entries implicitly: lookups return `Option`, and `insert` refuses a key
//! that is already present instead of silently replacing the node.

use std::collections::btree_map::{self, BTreeMap};
use thiserror::Error;

/// Error type for ObjectStore operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    AlreadyExists,

    #[error("Reference count underflow")]
    RefCountUnderflow,
}

/// Trait for nodes that carry a reference count.
pub trait HasRefCount {
    /// Increments the reference count and returns the new value.
    fn increment_ref(&mut self) -> u32;

    /// Decrements the reference count and returns the new value.
    ///
    /// Returns `None` if the count would underflow.
    fn decrement_ref(&mut self) -> Option<u32>;

    /// Returns the current reference count.
    fn ref_count(&self) -> u32;
}

/// An ordered, handle-keyed store with O(log n) insert, lookup and removal.
///
/// Iteration follows key order, so two stores built from the same
/// operations compare and print identically.
///
/// # Example
///
/// ```
/// use sonic_orch_common::{ObjectStore, StoreError};
///
/// let mut store: ObjectStore<u64, &str> = ObjectStore::new();
/// store.insert(0x21, "queue").unwrap();
///
/// assert_eq!(store.insert(0x21, "again"), Err(StoreError::AlreadyExists));
/// assert_eq!(store.get(&0x21), Some(&"queue"));
/// assert!(store.get(&0x22).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStore<K, V> {
    inner: BTreeMap<K, V>,
}

impl<K: Ord, V> ObjectStore<K, V> {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Returns the number of nodes in the store.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns true if the store holds a node for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Inserts a node.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the key is taken; the
    /// existing node is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), StoreError> {
        match self.inner.entry(key) {
            btree_map::Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Returns a reference to the node for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns a mutable reference to the node for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    /// Like [`get`](Self::get) but reports a missing key as an error.
    pub fn require(&self, key: &K) -> Result<&V, StoreError> {
        self.inner.get(key).ok_or(StoreError::KeyNotFound)
    }

    /// Like [`get_mut`](Self::get_mut) but reports a missing key as an error.
    pub fn require_mut(&mut self, key: &K) -> Result<&mut V, StoreError> {
        self.inner.get_mut(key).ok_or(StoreError::KeyNotFound)
    }

    /// Removes and returns the node for `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    /// Removes all nodes.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns an iterator over key-node pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    /// Returns an iterator over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    /// Returns an iterator over nodes in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    /// Returns a mutable iterator over nodes in key order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }
}

impl<K: Ord, V: HasRefCount> ObjectStore<K, V> {
    /// Increments the reference count of the node for `key`.
    ///
    /// **This never creates nodes.**
    pub fn increment_ref(&mut self, key: &K) -> Result<u32, StoreError> {
        self.require_mut(key).map(|node| node.increment_ref())
    }

    /// Decrements the reference count of the node for `key`.
    pub fn decrement_ref(&mut self, key: &K) -> Result<u32, StoreError> {
        self.require_mut(key)?
            .decrement_ref()
            .ok_or(StoreError::RefCountUnderflow)
    }

    /// Returns the reference count of the node for `key`.
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        self.inner.get(key).map(|node| node.ref_count())
    }
}

impl<K: Ord, V> Default for ObjectStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for ObjectStore<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
